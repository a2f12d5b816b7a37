//! Tour repository port.
//!
//! The core depends only on [`TourRepository`]; storage backends live in
//! other crates. [`MemoryTourRepo`] is the in-process implementation used by
//! tests and by servers running without a database.
//!
//! Repositories assume pre-validated input and are expected to serialise
//! concurrent writes to the same tour id themselves. No optimistic
//! concurrency control happens here.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::tour::Tour;
use crate::types::{DbId, Timestamp};

/// Default page size for [`TourFilter`].
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Upper bound on a single page.
pub const MAX_LIST_LIMIT: i64 = 200;

// ---------------------------------------------------------------------------
// Records and filters
// ---------------------------------------------------------------------------

/// A stored tour with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourRecord {
    pub id: DbId,
    pub tour: Tour,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Listing filter. `search` matches titles case-insensitively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TourFilter {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TourFilter {
    pub fn effective_limit(&self) -> i64 {
        clamp_limit(self.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT)
    }

    pub fn effective_offset(&self) -> i64 {
        clamp_offset(self.offset)
    }

    /// Lower-cased, trimmed search needle, if any.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Clamp a requested page size into `1..=max`, defaulting when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TourRepository: Send + Sync {
    async fn get(&self, id: DbId) -> Result<TourRecord, CoreError>;

    /// Insert when `tour.id` is `None` (assigning an id), otherwise replace
    /// the stored tour with that id.
    async fn save(&self, tour: Tour) -> Result<TourRecord, CoreError>;

    /// Remove a tour together with its scenes and hotspots.
    async fn delete(&self, id: DbId) -> Result<(), CoreError>;

    /// Tours ordered by id.
    async fn list(&self, filter: &TourFilter) -> Result<Vec<TourRecord>, CoreError>;

    async fn count(&self) -> Result<usize, CoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    next_id: DbId,
    records: BTreeMap<DbId, TourRecord>,
}

/// [`TourRepository`] backed by a map behind a tokio `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryTourRepo {
    state: RwLock<MemoryState>,
}

impl MemoryTourRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TourRepository for MemoryTourRepo {
    async fn get(&self, id: DbId) -> Result<TourRecord, CoreError> {
        self.state
            .read()
            .await
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Tour", id))
    }

    async fn save(&self, tour: Tour) -> Result<TourRecord, CoreError> {
        let mut state = self.state.write().await;
        let now = chrono::Utc::now();

        let record = match tour.id {
            None => {
                state.next_id += 1;
                let id = state.next_id;
                TourRecord {
                    id,
                    tour: tour.with_id(Some(id)),
                    created_at: now,
                    updated_at: now,
                }
            }
            Some(id) => {
                let existing = state
                    .records
                    .get(&id)
                    .ok_or_else(|| CoreError::not_found("Tour", id))?;
                TourRecord {
                    id,
                    tour,
                    created_at: existing.created_at,
                    updated_at: now,
                }
            }
        };

        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        self.state
            .write()
            .await
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("Tour", id))
    }

    async fn list(&self, filter: &TourFilter) -> Result<Vec<TourRecord>, CoreError> {
        let needle = filter.needle();
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|r| match &needle {
                Some(n) => r.tour.title.to_lowercase().contains(n),
                None => true,
            })
            .skip(filter.effective_offset() as usize)
            .take(filter.effective_limit() as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize, CoreError> {
        Ok(self.state.read().await.records.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TourDocument;
    use crate::limits::TierLimits;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn tour(title: &str) -> Tour {
        let doc: TourDocument = serde_json::from_value(json!({
            "title": title,
            "scenes": [{ "id": "s1", "title": "Lobby", "image": { "url": "https://x/a.jpg" } }]
        }))
        .unwrap();
        Tour::from_document(&doc, &TierLimits::lite()).unwrap()
    }

    #[test]
    fn limit_clamping() {
        assert_eq!(clamp_limit(None, 50, 200), 50);
        assert_eq!(clamp_limit(Some(0), 50, 200), 1);
        assert_eq!(clamp_limit(Some(1000), 50, 200), 200);
        assert_eq!(clamp_offset(Some(-5)), 0);
    }

    #[tokio::test]
    async fn save_assigns_ids_and_keeps_them() {
        let repo = MemoryTourRepo::new();
        let first = repo.save(tour("One")).await.unwrap();
        let second = repo.save(tour("Two")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.tour.id, Some(1));

        let mut renamed = first.tour.clone();
        renamed.title = "Uno".into();
        let updated = repo.save(renamed).await.unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.created_at, first.created_at);
        assert_eq!(repo.get(1).await.unwrap().tour.title, "Uno");
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn saving_unknown_id_is_not_found() {
        let repo = MemoryTourRepo::new();
        let err = repo.save(tour("Ghost").with_id(Some(99))).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Tour", .. });
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let repo = MemoryTourRepo::new();
        let record = repo.save(tour("Gone")).await.unwrap();
        repo.delete(record.id).await.unwrap();
        assert_matches!(repo.get(record.id).await, Err(CoreError::NotFound { .. }));
        assert_matches!(repo.delete(record.id).await, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let repo = MemoryTourRepo::new();
        for title in ["Harbour", "Museum", "Old harbour", "Park"] {
            repo.save(tour(title)).await.unwrap();
        }

        let filter = TourFilter {
            search: Some("HARBOUR".into()),
            ..Default::default()
        };
        let titles: Vec<_> = repo
            .list(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.tour.title)
            .collect();
        assert_eq!(titles, vec!["Harbour", "Old harbour"]);

        let page = TourFilter {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        };
        let ids: Vec<_> = repo.list(&page).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
