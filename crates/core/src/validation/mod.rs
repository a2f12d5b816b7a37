//! Tour validation engine.
//!
//! Provides error types and field constraints, the pure-logic tour
//! evaluator, and import-document validation, all without I/O.

pub mod evaluator;
pub mod import;
pub mod rules;

pub use evaluator::{
    hotspot_path, is_valid_id, is_well_formed_url, scene_path, validate_tour,
    validate_tour_with_media,
};
pub use import::{is_supported_version, validate_import_document};
pub use rules::{MediaLookup, ValidationError, ValidationErrors};
