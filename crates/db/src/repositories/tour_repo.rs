//! Repository for the `tours` table.
//!
//! Implements the core [`TourRepository`] port on PostgreSQL. Each tour is a
//! single row, so a save is one statement and needs no transaction.

use async_trait::async_trait;
use panotour_core::error::CoreError;
use panotour_core::types::DbId;
use panotour_core::{Tour, TourFilter, TourRecord, TourRepository};
use sqlx::PgPool;

use crate::models::tour::{TourColumns, TourRow};

/// Column list for `tours` queries.
const COLUMNS: &str = "id, title, config, scene_count, created_at, updated_at";

/// Log a database failure and surface it as an internal error.
fn db_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Tour repository query failed");
    CoreError::Internal(format!("Database error: {err}"))
}

/// Escape `LIKE` wildcards in a user-supplied search needle.
pub fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Debug, Clone)]
pub struct PgTourRepo {
    pool: PgPool,
}

impl PgTourRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, columns: TourColumns) -> Result<TourRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tours (title, config, scene_count) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TourRow>(&query)
            .bind(&columns.title)
            .bind(&columns.config)
            .bind(columns.scene_count)
            .fetch_one(&self.pool)
            .await
    }

    async fn replace(&self, id: DbId, columns: TourColumns) -> Result<Option<TourRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tours SET title = $2, config = $3, scene_count = $4 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TourRow>(&query)
            .bind(id)
            .bind(&columns.title)
            .bind(&columns.config)
            .bind(columns.scene_count)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait]
impl TourRepository for PgTourRepo {
    async fn get(&self, id: DbId) -> Result<TourRecord, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM tours WHERE id = $1");
        sqlx::query_as::<_, TourRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| CoreError::not_found("Tour", id))?
            .into_record()
    }

    async fn save(&self, tour: Tour) -> Result<TourRecord, CoreError> {
        let columns = TourColumns::from(&tour);
        let row = match tour.id {
            None => self.insert(columns).await.map_err(db_error)?,
            Some(id) => self
                .replace(id, columns)
                .await
                .map_err(db_error)?
                .ok_or_else(|| CoreError::not_found("Tour", id))?,
        };
        row.into_record()
    }

    async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Tour", id));
        }
        Ok(())
    }

    async fn list(&self, filter: &TourFilter) -> Result<Vec<TourRecord>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM tours \
             WHERE ($1::TEXT IS NULL OR LOWER(title) LIKE $1) \
             ORDER BY id \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, TourRow>(&query)
            .bind(filter.needle().map(|n| like_pattern(&n)))
            .bind(filter.effective_limit())
            .bind(filter.effective_offset())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(TourRow::into_record).collect()
    }

    async fn count(&self) -> Result<usize, CoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tours")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
