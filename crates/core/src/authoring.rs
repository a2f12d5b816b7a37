//! Tour authoring service.
//!
//! [`TourService`] combines validation, tier limits and the repository port
//! into the operations the authoring surface needs. Every write validates
//! the complete tour first; nothing is persisted on failure.

use std::sync::Arc;

use serde::Serialize;

use crate::document::TourDocument;
use crate::error::CoreError;
use crate::limits::TierLimits;
use crate::repository::{TourFilter, TourRecord, TourRepository, MAX_LIST_LIMIT};
use crate::tour::Tour;
use crate::tour_export::{export_tour, export_tours, import_document, import_single};
use crate::types::{DbId, Timestamp};
use crate::validation::rules::MAX_TITLE_LENGTH;
use crate::validation::{validate_tour, ValidationError};

/// Suffix appended to the title of a duplicated tour.
pub const COPY_SUFFIX: &str = " (Copy)";

/// Outcome of a batch import: what was created and what was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct BatchImportReport {
    pub created: Vec<TourRecord>,
    pub errors: Vec<ValidationError>,
}

pub struct TourService {
    repo: Arc<dyn TourRepository>,
    limits: TierLimits,
}

impl TourService {
    pub fn new(repo: Arc<dyn TourRepository>, limits: TierLimits) -> Self {
        Self { repo, limits }
    }

    pub fn limits(&self) -> &TierLimits {
        &self.limits
    }

    /// Validate a draft without saving it.
    pub fn validate(&self, doc: &TourDocument) -> Vec<ValidationError> {
        validate_tour(doc, &self.limits)
    }

    pub async fn get(&self, id: DbId) -> Result<TourRecord, CoreError> {
        self.repo.get(id).await
    }

    pub async fn list(&self, filter: &TourFilter) -> Result<Vec<TourRecord>, CoreError> {
        self.repo.list(filter).await
    }

    fn limit_message(max: usize) -> String {
        format!("This edition allows at most {max} tours")
    }

    /// Fail with [`CoreError::LimitReached`] when one more tour would exceed
    /// `max_tours`.
    async fn ensure_capacity(&self) -> Result<(), CoreError> {
        if let Some(max) = self.limits.max_tours {
            if self.repo.count().await? >= max {
                return Err(CoreError::LimitReached(Self::limit_message(max)));
            }
        }
        Ok(())
    }

    pub async fn create(&self, doc: &TourDocument) -> Result<TourRecord, CoreError> {
        let tour = Tour::from_document(doc, &self.limits)?;
        self.ensure_capacity().await?;
        let record = self.repo.save(tour).await?;
        tracing::info!(tour_id = record.id, scenes = record.tour.scene_count(), "Tour created");
        Ok(record)
    }

    /// Replace a stored tour with a new document, keeping its id.
    pub async fn update(&self, id: DbId, doc: &TourDocument) -> Result<TourRecord, CoreError> {
        let tour = Tour::from_document(doc, &self.limits)?;
        self.repo.get(id).await?;
        let record = self.repo.save(tour.with_id(Some(id))).await?;
        tracing::info!(tour_id = id, "Tour updated");
        Ok(record)
    }

    /// Apply one editing operation to a stored tour and save the result.
    ///
    /// `op` receives the current tour and the active limits, and returns the
    /// new tour or the reason it was rejected.
    pub async fn edit<F>(&self, id: DbId, op: F) -> Result<TourRecord, CoreError>
    where
        F: FnOnce(&Tour, &TierLimits) -> Result<Tour, CoreError> + Send,
    {
        let current = self.repo.get(id).await?;
        let edited = op(&current.tour, &self.limits)?;
        let record = self.repo.save(edited.with_id(Some(id))).await?;
        tracing::debug!(tour_id = id, "Tour edited");
        Ok(record)
    }

    /// Delete a tour. Scenes and hotspots are part of the record and go
    /// with it.
    pub async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        self.repo.delete(id).await?;
        tracing::info!(tour_id = id, "Tour deleted");
        Ok(())
    }

    pub async fn duplicate(&self, id: DbId) -> Result<TourRecord, CoreError> {
        let source = self.repo.get(id).await?;
        self.ensure_capacity().await?;

        let mut copy = source.tour.with_id(None);
        copy.title = copy_title(&copy.title);
        let record = self.repo.save(copy).await?;
        tracing::info!(source_id = id, tour_id = record.id, "Tour duplicated");
        Ok(record)
    }

    /// Import a single tour, aborting on any validation error.
    pub async fn import_single(&self, json: &str) -> Result<TourRecord, CoreError> {
        let tour = import_single(json, &self.limits)?;
        self.ensure_capacity().await?;
        let record = self.repo.save(tour).await?;
        tracing::info!(tour_id = record.id, "Tour imported");
        Ok(record)
    }

    /// Import every valid tour of a document, skipping invalid ones.
    ///
    /// Once `max_tours` is reached the remaining valid tours are reported as
    /// limit errors instead of being saved.
    pub async fn import_batch(&self, json: &str) -> Result<BatchImportReport, CoreError> {
        let outcome = import_document(json, &self.limits)?;
        let mut report = BatchImportReport {
            created: Vec::new(),
            errors: outcome.errors,
        };

        let mut stored = self.repo.count().await?;
        for (tour, index) in outcome.tours.into_iter().zip(outcome.source_indices) {
            if let Some(max) = self.limits.max_tours {
                if stored >= max {
                    report.errors.push(
                        ValidationError::new("tour", Self::limit_message(max))
                            .with_tour_index(index),
                    );
                    continue;
                }
            }
            report.created.push(self.repo.save(tour).await?);
            stored += 1;
        }

        report.errors.sort_by_key(|e| e.tour_index);
        tracing::info!(
            created = report.created.len(),
            rejected = report.errors.len(),
            "Batch import finished",
        );
        Ok(report)
    }

    pub async fn export(&self, id: DbId) -> Result<String, CoreError> {
        let record = self.repo.get(id).await?;
        export_tour(&record.tour)
    }

    /// Export every stored tour in one envelope.
    pub async fn export_all(&self, exported_at: Timestamp) -> Result<String, CoreError> {
        let tours = self.all_tours().await?;
        export_tours(&tours, exported_at)
    }

    async fn all_tours(&self) -> Result<Vec<Tour>, CoreError> {
        let mut tours = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .repo
                .list(&TourFilter {
                    search: None,
                    limit: Some(MAX_LIST_LIMIT),
                    offset: Some(offset),
                })
                .await?;
            let fetched = page.len();
            tours.extend(page.into_iter().map(|r| r.tour));
            if (fetched as i64) < MAX_LIST_LIMIT {
                return Ok(tours);
            }
            offset += MAX_LIST_LIMIT;
        }
    }
}

/// `"<title> (Copy)"`, shortening the original so the result stays within
/// the title length limit.
fn copy_title(title: &str) -> String {
    let room = MAX_TITLE_LENGTH - COPY_SUFFIX.chars().count();
    let base: String = title.chars().take(room).collect();
    format!("{}{COPY_SUFFIX}", base.trim_end())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SceneDocument;
    use crate::repository::MemoryTourRepo;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn service(limits: TierLimits) -> TourService {
        TourService::new(Arc::new(MemoryTourRepo::new()), limits)
    }

    fn doc(title: &str) -> TourDocument {
        serde_json::from_value(json!({
            "title": title,
            "scenes": [
                { "id": "s1", "title": "Lobby", "image": { "url": "https://x/1.jpg" } },
                { "id": "s2", "title": "Hall", "image": { "url": "https://x/2.jpg" } }
            ]
        }))
        .unwrap()
    }

    fn small_limits(max_tours: usize) -> TierLimits {
        TierLimits {
            max_tours: Some(max_tours),
            ..TierLimits::lite()
        }
    }

    #[tokio::test]
    async fn create_rejects_invalid_without_saving() {
        let svc = service(TierLimits::lite());
        let err = svc.create(&TourDocument::default()).await.unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) if errors.len() == 2);
        assert!(svc.list(&TourFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_enforces_tour_limit() {
        let svc = service(small_limits(2));
        svc.create(&doc("A")).await.unwrap();
        svc.create(&doc("B")).await.unwrap();
        let err = svc.create(&doc("C")).await.unwrap_err();
        assert_matches!(err, CoreError::LimitReached(msg) => {
            assert_eq!(msg, "This edition allows at most 2 tours");
        });
    }

    #[tokio::test]
    async fn update_keeps_id_and_requires_existing() {
        let svc = service(TierLimits::lite());
        let record = svc.create(&doc("Old")).await.unwrap();
        let updated = svc.update(record.id, &doc("New")).await.unwrap();
        assert_eq!(updated.id, record.id);
        assert_eq!(updated.tour.title, "New");
        assert_matches!(svc.update(99, &doc("X")).await, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn edit_applies_operation_or_keeps_prior_state() {
        let svc = service(TierLimits::lite());
        let record = svc.create(&doc("Tour")).await.unwrap();

        let scene: SceneDocument = serde_json::from_value(json!({
            "id": "s3", "title": "Roof", "image": { "url": "https://x/3.jpg" }
        }))
        .unwrap();
        let edited = svc
            .edit(record.id, |tour, limits| tour.add_scene(scene, limits))
            .await
            .unwrap();
        assert_eq!(edited.tour.scene_count(), 3);

        let err = svc
            .edit(record.id, |tour, limits| tour.remove_scene("nope", limits))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
        assert_eq!(svc.get(record.id).await.unwrap().tour.scene_count(), 3);
    }

    #[tokio::test]
    async fn duplicate_appends_copy_suffix() {
        let svc = service(TierLimits::lite());
        let record = svc.create(&doc("Campus")).await.unwrap();
        let copy = svc.duplicate(record.id).await.unwrap();
        assert_ne!(copy.id, record.id);
        assert_eq!(copy.tour.title, "Campus (Copy)");
        assert_eq!(copy.tour.scenes, record.tour.scenes);
    }

    #[test]
    fn copy_title_stays_within_limit() {
        let long = "t".repeat(MAX_TITLE_LENGTH);
        let copied = copy_title(&long);
        assert_eq!(copied.chars().count(), MAX_TITLE_LENGTH);
        assert!(copied.ends_with(" (Copy)"));
    }

    #[tokio::test]
    async fn import_batch_skips_invalid_and_respects_limit() {
        let svc = service(small_limits(2));
        let envelope = json!({
            "version": "1.0",
            "tours": [
                { "config": doc("One") },
                { "config": { "title": "", "scenes": [] } },
                { "config": doc("Two") },
                { "config": doc("Three") }
            ]
        });
        let report = svc.import_batch(&envelope.to_string()).await.unwrap();
        assert_eq!(report.created.len(), 2);
        let indices: Vec<_> = report.errors.iter().map(|e| e.tour_index).collect();
        assert_eq!(indices, vec![Some(1), Some(1), Some(3)]);
        assert_eq!(report.errors[2].message, "This edition allows at most 2 tours");
    }

    #[tokio::test]
    async fn import_single_aborts_on_invalid() {
        let svc = service(TierLimits::lite());
        let err = svc
            .import_single(r#"{ "title": "No scenes" }"#)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
        assert_eq!(svc.list(&TourFilter::default()).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn export_then_import_recreates_tour() {
        let svc = service(TierLimits::lite());
        let record = svc.create(&doc("Round")).await.unwrap();
        let json = svc.export(record.id).await.unwrap();
        let imported = svc.import_single(&json).await.unwrap();
        assert_eq!(imported.tour.with_id(None), record.tour.with_id(None));
    }

    #[tokio::test]
    async fn export_all_wraps_every_tour() {
        let svc = service(TierLimits::unrestricted());
        for title in ["A", "B", "C"] {
            svc.create(&doc(title)).await.unwrap();
        }
        let json = svc.export_all(chrono::Utc::now()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["tours"].as_array().unwrap().len(), 3);
        assert_eq!(value["tours"][1]["config"]["title"], "B");
    }
}
