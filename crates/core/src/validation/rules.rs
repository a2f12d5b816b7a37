//! Validation error types, field constraints and the media lookup port.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field constraints
// ---------------------------------------------------------------------------

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_TEXT_LENGTH: usize = 1000;

pub const MIN_YAW: f64 = -180.0;
pub const MAX_YAW: f64 = 180.0;
pub const MIN_PITCH: f64 = -90.0;
pub const MAX_PITCH: f64 = 90.0;
pub const MIN_FOV: f64 = 10.0;
pub const MAX_FOV: f64 = 120.0;

pub const MIN_AUTOROTATE_SPEED: f64 = 0.1;
pub const MAX_AUTOROTATE_SPEED: f64 = 2.0;

/// Icons a hotspot may declare.
pub const HOTSPOT_ICONS: &[&str] = &[
    "info",
    "link",
    "arrow",
    "arrow-left",
    "arrow-right",
    "arrow-up",
    "camera",
    "image",
    "video",
    "audio",
    "star",
    "pin",
];

/// MIME types accepted for managed panorama images.
pub const ALLOWED_IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A single rule violation.
///
/// `path` names the offending entity in author-facing terms, e.g.
/// `"scene 2 (Lobby): hotspot 4"`. `tour_index` is set when the error
/// came out of a bulk import and identifies the tour's position in the
/// source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tour_index: Option<usize>,
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tour_index: None,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Annotate the error with the tour's index in an import document.
    pub fn with_tour_index(mut self, index: usize) -> Self {
        self.tour_index = Some(index);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.tour_index {
            write!(f, "tour {}: ", index + 1)?;
        }
        write!(f, "{}: {}", self.path, self.message)
    }
}

// ---------------------------------------------------------------------------
// ValidationErrors
// ---------------------------------------------------------------------------

/// The complete list of violations for one operation.
///
/// Carried inside [`crate::error::CoreError::Validation`] so callers can
/// render every failure at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![ValidationError::new(path, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ---------------------------------------------------------------------------
// Media lookup
// ---------------------------------------------------------------------------

/// Resolves managed media ids to their stored MIME type.
///
/// Implemented by the media library collaborator. Returns `None` when the
/// id does not refer to an existing attachment.
pub trait MediaLookup {
    fn mime_type(&self, media_id: u64) -> Option<String>;
}

impl<F> MediaLookup for F
where
    F: Fn(u64) -> Option<String>,
{
    fn mime_type(&self, media_id: u64) -> Option<String> {
        self(media_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
