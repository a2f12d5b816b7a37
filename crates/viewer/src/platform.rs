//! Host platform port: the page the viewer is embedded in.

use panotour_core::tour::{Hotspot, HotspotType};
use serde::Serialize;

use crate::engine::ContainerHandle;

/// How a link hotspot's target is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewContext {
    /// A new browsing context with no reference back to the opener.
    NoOpener,
}

/// Content of the in-page modal shown for info and media hotspots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalContent {
    pub hotspot_id: String,
    pub kind: HotspotType,
    pub title: Option<String>,
    pub text: Option<String>,
    pub media_url: Option<String>,
}

impl ModalContent {
    pub fn for_hotspot(hotspot: &Hotspot) -> Self {
        Self {
            hotspot_id: hotspot.id.clone(),
            kind: hotspot.kind.hotspot_type(),
            title: hotspot.title.clone(),
            text: hotspot.text.clone(),
            media_url: hotspot.kind.url().map(str::to_string),
        }
    }
}

/// Events the host platform delivers to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// A fullscreen request on the container succeeded.
    FullscreenEntered,
    /// Fullscreen ended, by request or by the user (Escape, browser chrome).
    FullscreenExited,
    /// A fullscreen request was refused.
    FullscreenFailed(String),
    /// The viewport changed size outside the engine's observation.
    Resized,
}

/// Capabilities of the hosting page.
///
/// Fullscreen requests are asynchronous: their outcome comes back as a
/// [`PlatformEvent`].
pub trait HostPlatform: Send {
    fn container_exists(&self, container: &ContainerHandle) -> bool;

    fn attach_listeners(&mut self, container: &ContainerHandle);

    fn detach_listeners(&mut self, container: &ContainerHandle);

    fn request_fullscreen(&mut self, container: &ContainerHandle);

    fn exit_fullscreen(&mut self);

    fn open_url(&mut self, url: &str, context: NewContext);

    fn open_modal(&mut self, content: ModalContent);
}
