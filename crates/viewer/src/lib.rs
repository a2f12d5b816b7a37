//! Panorama tour viewer runtime.
//!
//! - [`Viewer`]: one embedded viewer instance driving a panorama engine.
//! - [`state`]: the pure phase machine ([`reduce`]) behind it.
//! - [`PanoramaEngine`] / [`EngineFactory`]: the rendering engine port.
//! - [`HostPlatform`]: the hosting page port (listeners, fullscreen, modals).

pub mod engine;
pub mod error;
pub mod platform;
pub mod state;
pub mod viewer;

pub use engine::{
    build_engine_config, ContainerHandle, EngineConfig, EngineEvent, EngineFactory, LoadTicket,
    PanoramaEngine,
};
pub use error::{EngineError, ViewerError};
pub use platform::{HostPlatform, ModalContent, NewContext, PlatformEvent};
pub use state::{reduce, ViewerEffect, ViewerInput, ViewerPhase, ViewerState};
pub use viewer::Viewer;
