//! Tour rows.

use panotour_core::error::CoreError;
use panotour_core::types::{DbId, Timestamp};
use panotour_core::{TierLimits, Tour, TourDocument, TourRecord};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `tours` table.
///
/// `config` holds the tour document in its export format; `title` and
/// `scene_count` are denormalised from it for listing and search.
#[derive(Debug, Clone, FromRow)]
pub struct TourRow {
    pub id: DbId,
    pub title: String,
    pub config: Json<TourDocument>,
    pub scene_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TourRow {
    /// Rebuild the validated model from the stored document.
    ///
    /// Stored tours were validated when written, under whatever edition was
    /// active then, so they are re-read without edition ceilings.
    pub fn into_record(self) -> Result<TourRecord, CoreError> {
        let tour = Tour::from_document(&self.config.0, &TierLimits::unrestricted())
            .map_err(|errors| {
                CoreError::Internal(format!("Stored tour {} is invalid: {errors}", self.id))
            })?
            .with_id(Some(self.id));

        Ok(TourRecord {
            id: self.id,
            tour,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Column values written for a tour.
#[derive(Debug, Clone)]
pub struct TourColumns {
    pub title: String,
    pub config: Json<TourDocument>,
    pub scene_count: i32,
}

impl From<&Tour> for TourColumns {
    fn from(tour: &Tour) -> Self {
        Self {
            title: tour.title.clone(),
            config: Json(tour.to_document()),
            scene_count: i32::try_from(tour.scene_count()).unwrap_or(i32::MAX),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
