//! Panotour core: tour data model, validation and import/export.
//!
//! - [`document`]: loose serde shapes of tours as authored or exchanged.
//! - [`tour`]: the validated model, traversal and editing operations.
//! - [`validation`]: the pure validation engine.
//! - [`limits`]: edition limits injected into validation.
//! - [`tour_export`]: export envelope and import pipeline.
//! - [`repository`]: storage port and the in-memory repository.
//! - [`authoring`]: [`TourService`], the authoring operations.

pub mod authoring;
pub mod document;
pub mod error;
pub mod limits;
pub mod repository;
pub mod tour;
pub mod tour_export;
pub mod types;
pub mod validation;

pub use authoring::{BatchImportReport, TourService};
pub use document::{HotspotDocument, SceneDocument, TourDocument};
pub use error::CoreError;
pub use limits::TierLimits;
pub use repository::{MemoryTourRepo, TourFilter, TourRecord, TourRepository};
pub use tour::{Hotspot, HotspotKind, HotspotType, Scene, SceneType, Tour};
pub use validation::{validate_tour, ValidationError, ValidationErrors};
