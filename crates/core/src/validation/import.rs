//! Bulk import document validation.
//!
//! An import document is an envelope `{ version, tours: [{ config }] }`.
//! A missing or malformed envelope yields a single `document` error; a
//! well-formed envelope is validated tour by tour, each error annotated
//! with the tour's index in the source.

use serde_json::Value;

use super::evaluator::validate_tour;
use super::rules::ValidationError;
use crate::document::TourDocument;
use crate::limits::TierLimits;

/// Path reported for envelope-level errors.
pub const DOCUMENT_PATH: &str = "document";

/// Major version of the import/export format this build reads.
pub const SUPPORTED_MAJOR_VERSION: &str = "1";

/// Whether `version` belongs to the supported major (`"1"`, `"1.0"`, `"1.2"`, ...).
pub fn is_supported_version(version: &str) -> bool {
    let version = version.trim();
    version == SUPPORTED_MAJOR_VERSION
        || version
            .strip_prefix(SUPPORTED_MAJOR_VERSION)
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|minor| !minor.is_empty())
}

/// Validate every tour in a bulk import document.
pub fn validate_import_document(doc: &Value, limits: &TierLimits) -> Vec<ValidationError> {
    let entries = match check_envelope(doc) {
        Ok(entries) => entries,
        Err(error) => return vec![error],
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| validate_entry(i, entry, limits).err())
        .flatten()
        .collect()
}

/// Check the envelope and return the tour entries.
pub(crate) fn check_envelope(doc: &Value) -> Result<&Vec<Value>, ValidationError> {
    let Some(object) = doc.as_object() else {
        return Err(ValidationError::new(
            DOCUMENT_PATH,
            "Import document must be a JSON object",
        ));
    };

    match object.get("version") {
        None | Some(Value::Null) => {
            return Err(ValidationError::new(
                DOCUMENT_PATH,
                "Import document is missing a version",
            ))
        }
        Some(Value::String(v)) if is_supported_version(v) => {}
        Some(Value::String(v)) => {
            return Err(ValidationError::new(
                DOCUMENT_PATH,
                format!("Unsupported import format version '{v}'"),
            ))
        }
        Some(_) => {
            return Err(ValidationError::new(
                DOCUMENT_PATH,
                "Import document version must be a string",
            ))
        }
    }

    object
        .get("tours")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ValidationError::new(DOCUMENT_PATH, "Import document must contain a tours array")
        })
}

/// Parse and validate one `{ config }` entry.
///
/// Every returned error carries `index`.
pub(crate) fn validate_entry(
    index: usize,
    entry: &Value,
    limits: &TierLimits,
) -> Result<TourDocument, Vec<ValidationError>> {
    let annotate = |errors: Vec<ValidationError>| -> Vec<ValidationError> {
        errors.into_iter().map(|e| e.with_tour_index(index)).collect()
    };

    let Some(config) = entry.get("config").filter(|c| c.is_object()) else {
        return Err(annotate(vec![ValidationError::new(
            "tour",
            "Tour entry must contain a config object",
        )]));
    };

    let draft: TourDocument = serde_json::from_value(config.clone()).map_err(|e| {
        annotate(vec![ValidationError::new(
            "tour",
            format!("Tour configuration could not be read: {e}"),
        )])
    })?;

    let errors = validate_tour(&draft, limits);
    if errors.is_empty() {
        Ok(draft)
    } else {
        Err(annotate(errors))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
