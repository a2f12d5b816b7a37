//! Tour import/export.
//!
//! Defines the portable export envelope and the import pipeline. A single
//! tour exports as a bare [`TourDocument`]; several tours export inside an
//! [`ExportEnvelope`]. Import accepts either shape and runs every tour
//! through validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::TourDocument;
use crate::error::CoreError;
use crate::limits::TierLimits;
use crate::tour::Tour;
use crate::types::Timestamp;
use crate::validation::import::{check_envelope, validate_entry};
use crate::validation::{validate_tour, ValidationError, ValidationErrors};

/// Format version written into new export envelopes.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Export envelope
// ---------------------------------------------------------------------------

/// A portable multi-tour export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<Timestamp>,
    pub tours: Vec<ExportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub config: TourDocument,
}

impl ExportEnvelope {
    pub fn new<'a>(tours: impl IntoIterator<Item = &'a Tour>, exported_at: Timestamp) -> Self {
        Self {
            version: EXPORT_FORMAT_VERSION.to_string(),
            exported_at: Some(exported_at),
            tours: tours
                .into_iter()
                .map(|tour| ExportEntry {
                    config: tour.to_document(),
                })
                .collect(),
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, CoreError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::Internal(format!("Failed to serialise export: {e}")))
}

/// Serialise one tour as a pretty-printed [`TourDocument`].
///
/// The output is byte-stable: exporting the same tour twice yields the same
/// string.
pub fn export_tour(tour: &Tour) -> Result<String, CoreError> {
    to_pretty_json(&tour.to_document())
}

/// Serialise several tours inside an [`ExportEnvelope`].
pub fn export_tours(tours: &[Tour], exported_at: Timestamp) -> Result<String, CoreError> {
    to_pretty_json(&ExportEnvelope::new(tours, exported_at))
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Result of importing a document: the tours that passed validation and the
/// errors of those that did not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub tours: Vec<Tour>,
    pub errors: Vec<ValidationError>,
    /// Position of each entry of `tours` in the source document.
    #[serde(skip)]
    pub source_indices: Vec<usize>,
}

impl ImportOutcome {
    /// Number of distinct source tours that were rejected.
    pub fn rejected_count(&self) -> usize {
        let mut indices: Vec<usize> = self.errors.iter().filter_map(|e| e.tour_index).collect();
        indices.dedup();
        indices.len()
    }
}

/// Parse and validate an import document.
///
/// Accepts an [`ExportEnvelope`] (detected by a `tours` key) or a bare
/// [`TourDocument`]. JSON syntax errors and malformed envelopes abort with
/// [`CoreError::MalformedDocument`]; invalid tours are left out of
/// `tours` and their errors, annotated with the source index, are collected
/// in `errors`.
pub fn import_document(json: &str, limits: &TierLimits) -> Result<ImportOutcome, CoreError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| CoreError::MalformedDocument(format!("Invalid JSON: {e}")))?;
    import_value(&value, limits)
}

/// [`import_document`] over an already parsed JSON value.
pub fn import_value(value: &Value, limits: &TierLimits) -> Result<ImportOutcome, CoreError> {
    if value.get("tours").is_some() {
        import_envelope(value, limits)
    } else {
        import_bare(value, limits)
    }
}

fn import_envelope(value: &Value, limits: &TierLimits) -> Result<ImportOutcome, CoreError> {
    let entries =
        check_envelope(value).map_err(|e| CoreError::MalformedDocument(e.message))?;

    let mut outcome = ImportOutcome::default();
    for (index, entry) in entries.iter().enumerate() {
        let built = validate_entry(index, entry, limits).and_then(|draft| {
            Tour::from_document(&draft, limits)
                .map_err(|errors| annotate(errors, index))
        });
        match built {
            Ok(tour) => {
                outcome.tours.push(tour);
                outcome.source_indices.push(index);
            }
            Err(errors) => {
                tracing::debug!(tour_index = index, errors = errors.len(), "Skipping invalid tour");
                outcome.errors.extend(errors);
            }
        }
    }
    Ok(outcome)
}

fn import_bare(value: &Value, limits: &TierLimits) -> Result<ImportOutcome, CoreError> {
    if !value.is_object() {
        return Err(CoreError::MalformedDocument(
            "Import document must be a JSON object".into(),
        ));
    }
    let draft: TourDocument = serde_json::from_value(value.clone()).map_err(|e| {
        CoreError::MalformedDocument(format!("Tour configuration could not be read: {e}"))
    })?;

    let errors = validate_tour(&draft, limits);
    if !errors.is_empty() {
        return Ok(ImportOutcome {
            errors: annotate(errors.into(), 0),
            ..Default::default()
        });
    }
    let tour = Tour::from_document(&draft, limits).map_err(CoreError::Validation)?;
    Ok(ImportOutcome {
        tours: vec![tour],
        errors: Vec::new(),
        source_indices: vec![0],
    })
}

fn annotate(errors: ValidationErrors, index: usize) -> Vec<ValidationError> {
    errors
        .into_inner()
        .into_iter()
        .map(|e| e.with_tour_index(index))
        .collect()
}

/// Import exactly one tour, aborting if it is invalid.
pub fn import_single(json: &str, limits: &TierLimits) -> Result<Tour, CoreError> {
    let outcome = import_document(json, limits)?;
    if !outcome.errors.is_empty() {
        return Err(CoreError::Validation(outcome.errors.into()));
    }
    let mut tours = outcome.tours;
    match tours.len() {
        1 => Ok(tours.remove(0)),
        0 => Err(CoreError::MalformedDocument(
            "Import document contains no tours".into(),
        )),
        n => Err(CoreError::MalformedDocument(format!(
            "Expected a single tour, found {n}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use serde_json::json;

    fn minimal_json() -> String {
        json!({
            "title": "Demo",
            "scenes": [{
                "id": "s1",
                "title": "Lobby",
                "type": "equirectangular",
                "image": { "url": "https://x/img.jpg" },
                "hotspots": []
            }]
        })
        .to_string()
    }

    fn rich_tour() -> Tour {
        let doc: TourDocument = serde_json::from_value(json!({
            "title": "Harbour walk",
            "description": "Sunset route",
            "settings": {
                "showCompass": true,
                "autorotate": { "enabled": true, "speed": 1.25 },
                "branding": { "logoUrl": "https://x/logo.png", "position": "top-left" }
            },
            "scenes": [
                {
                    "id": "pier",
                    "title": "Pier",
                    "type": "cubemap",
                    "image": { "id": 9, "url": "https://x/pier.jpg" },
                    "initialView": { "yaw": 90, "pitch": -10, "fov": 75 },
                    "hotspots": [
                        { "id": "next", "type": "scene", "targetSceneId": "bay",
                          "position": { "yaw": 12.5, "pitch": 1 }, "icon": "arrow" },
                        { "id": "sign", "type": "info", "title": "Sign", "text": "Built 1902",
                          "position": { "yaw": -30, "pitch": 5 } }
                    ]
                },
                {
                    "id": "bay",
                    "title": "Bay",
                    "isDefault": true,
                    "image": { "url": "https://x/bay.jpg" },
                    "hotspots": [
                        { "id": "web", "type": "link", "url": "https://example.com",
                          "position": { "yaw": 0, "pitch": 0 } }
                    ]
                }
            ]
        }))
        .unwrap();
        Tour::from_document(&doc, &TierLimits::lite()).unwrap()
    }

    #[test]
    fn minimal_tour_round_trips() {
        let tour = import_single(&minimal_json(), &TierLimits::lite()).unwrap();
        let exported = export_tour(&tour).unwrap();
        let outcome = import_document(&exported, &TierLimits::lite()).unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.tours[0], tour);
    }

    #[test]
    fn rich_tour_round_trips() {
        let tour = rich_tour();
        let outcome = import_document(&export_tour(&tour).unwrap(), &TierLimits::lite()).unwrap();
        assert_eq!(outcome.tours, vec![tour]);
    }

    #[test]
    fn export_is_byte_stable() {
        let tour = rich_tour();
        assert_eq!(export_tour(&tour).unwrap(), export_tour(&tour).unwrap());
    }

    #[test]
    fn export_uses_two_space_indent_and_document_field_order() {
        let exported = export_tour(&rich_tour()).unwrap();
        assert!(exported.starts_with("{\n  \"title\": \"Harbour walk\""));
        let settings = exported.find("\"settings\"").unwrap();
        let scenes = exported.find("\"scenes\"").unwrap();
        assert!(settings < scenes);
    }

    #[test]
    fn envelope_round_trips_all_tours() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let tours = vec![rich_tour(), import_single(&minimal_json(), &TierLimits::lite()).unwrap()];
        let exported = export_tours(&tours, at).unwrap();

        let envelope: ExportEnvelope = serde_json::from_str(&exported).unwrap();
        assert_eq!(envelope.version, EXPORT_FORMAT_VERSION);
        assert_eq!(envelope.exported_at, Some(at));

        let outcome = import_document(&exported, &TierLimits::lite()).unwrap();
        assert_eq!(outcome.tours, tours);
    }

    #[test]
    fn batch_import_skips_invalid_tours() {
        let doc = json!({
            "version": "1.0",
            "tours": [
                { "config": serde_json::from_str::<Value>(&minimal_json()).unwrap() },
                { "config": { "title": "Broken", "scenes": [] } },
                { "config": serde_json::from_str::<Value>(&minimal_json()).unwrap() }
            ]
        });
        let outcome = import_document(&doc.to_string(), &TierLimits::lite()).unwrap();
        assert_eq!(outcome.tours.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].tour_index, Some(1));
        assert_eq!(outcome.rejected_count(), 1);
    }

    #[test]
    fn syntax_error_is_malformed() {
        assert_matches!(
            import_document("{ not json", &TierLimits::lite()),
            Err(CoreError::MalformedDocument(msg)) if msg.starts_with("Invalid JSON")
        );
    }

    #[test]
    fn bad_envelope_is_malformed() {
        assert_matches!(
            import_document(r#"{ "tours": [] }"#, &TierLimits::lite()),
            Err(CoreError::MalformedDocument(msg)) if msg == "Import document is missing a version"
        );
    }

    #[test]
    fn single_import_aborts_on_invalid() {
        let json = json!({
            "title": "T",
            "scenes": [{
                "id": "s1", "title": "S", "image": { "url": "https://x/a.jpg" },
                "hotspots": [{ "id": "h1", "type": "link", "position": { "yaw": 0, "pitch": 0 } }]
            }]
        })
        .to_string();
        assert_matches!(
            import_single(&json, &TierLimits::lite()),
            Err(CoreError::Validation(errors)) => {
                assert_eq!(errors.0[0].message, "URL is required for link hotspots");
                assert_eq!(errors.0[0].tour_index, Some(0));
            }
        );
    }

    #[test]
    fn single_import_rejects_multi_tour_envelope() {
        let config = serde_json::from_str::<Value>(&minimal_json()).unwrap();
        let doc = json!({ "version": "1", "tours": [{ "config": config }, { "config": config }] });
        assert_matches!(
            import_single(&doc.to_string(), &TierLimits::lite()),
            Err(CoreError::MalformedDocument(_))
        );
    }
}
