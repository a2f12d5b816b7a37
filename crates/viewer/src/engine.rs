//! Panorama engine port and configuration mapping.
//!
//! The rendering engine is an external capability. The viewer configures it
//! through [`EngineConfig`] and drives it through [`PanoramaEngine`]; the
//! engine reports back with [`EngineEvent`]s carrying the [`LoadTicket`] of
//! the request they complete.

use std::fmt;

use panotour_core::tour::{BrandingPosition, Hotspot, HotspotKind, HotspotType, Scene, SceneType};
use panotour_core::Tour;
use serde::Serialize;

use crate::error::{EngineError, ViewerError};

/// Cross-fade between scenes, in milliseconds.
pub const DEFAULT_SCENE_FADE_MS: u32 = 1000;

// ---------------------------------------------------------------------------
// Handles and tickets
// ---------------------------------------------------------------------------

/// Host element the viewer renders into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle(pub String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one engine load request.
///
/// Tickets are issued in increasing order per viewer. A completion whose
/// ticket is not the latest one issued belongs to a superseded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LoadTicket(pub u64);

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Configuration handed to the engine on creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub default_scene: String,
    pub scene_fade_duration: u32,
    /// Rotation speed, absent when the tour does not autorotate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_rotate: Option<f64>,
    pub show_zoom_ctrl: bool,
    pub show_fullscreen_ctrl: bool,
    pub compass: bool,
    pub orientation_on_by_default: bool,
    pub touch_pan: bool,
    pub scenes: Vec<EngineScene>,
    pub branding: EngineBranding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineScene {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub projection: SceneType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panorama: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hfov: Option<f64>,
    pub hot_spots: Vec<EngineHotspot>,
}

/// Engine marker primitive. Scene links are native engine markers; every
/// other kind is an info marker whose click the viewer dispatches itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Scene,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineHotspot {
    pub id: String,
    pub pitch: f64,
    pub yaw: f64,
    #[serde(rename = "type")]
    pub marker: MarkerKind,
    pub hotspot_type: HotspotType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub css_class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineBranding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_id: Option<u64>,
    pub position: BrandingPosition,
}

/// Map a tour to the engine's configuration, starting at its default scene.
pub fn build_engine_config(tour: &Tour) -> Result<EngineConfig, ViewerError> {
    let start = tour
        .default_scene()
        .map_err(|_| ViewerError::EmptyTour)?
        .id
        .clone();
    let settings = &tour.settings;

    Ok(EngineConfig {
        default_scene: start,
        scene_fade_duration: DEFAULT_SCENE_FADE_MS,
        auto_rotate: settings
            .autorotate
            .enabled
            .then_some(settings.autorotate.speed),
        show_zoom_ctrl: settings.show_zoom,
        show_fullscreen_ctrl: settings.show_fullscreen,
        compass: settings.show_compass,
        orientation_on_by_default: settings.mobile.gyro,
        touch_pan: settings.mobile.touch,
        scenes: tour.scenes.iter().map(engine_scene).collect(),
        branding: EngineBranding {
            logo_url: settings.branding.logo_url.clone(),
            logo_id: settings.branding.logo_id,
            position: settings.branding.position,
        },
    })
}

pub fn engine_scene(scene: &Scene) -> EngineScene {
    EngineScene {
        id: scene.id.clone(),
        title: scene.title.clone(),
        projection: scene.scene_type,
        panorama: scene.image.url.clone(),
        media_id: scene.image.id,
        yaw: scene.initial_view.yaw,
        pitch: scene.initial_view.pitch,
        hfov: scene.initial_view.fov,
        hot_spots: engine_hotspots(scene),
    }
}

pub fn engine_hotspots(scene: &Scene) -> Vec<EngineHotspot> {
    scene.hotspots.iter().map(engine_hotspot).collect()
}

pub fn engine_hotspot(hotspot: &Hotspot) -> EngineHotspot {
    let hotspot_type = hotspot.kind.hotspot_type();
    let (marker, scene_id) = match &hotspot.kind {
        HotspotKind::Scene { target_scene_id } => (MarkerKind::Scene, Some(target_scene_id.clone())),
        _ => (MarkerKind::Info, None),
    };

    EngineHotspot {
        id: hotspot.id.clone(),
        pitch: hotspot.position.pitch,
        yaw: hotspot.position.yaw,
        marker,
        hotspot_type,
        text: hotspot.title.clone().or_else(|| hotspot.text.clone()),
        scene_id,
        icon: hotspot.icon.clone(),
        css_class: format!("panotour-hotspot panotour-hotspot-{hotspot_type}"),
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Events the engine surfaces to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The panorama for `ticket` finished loading.
    Load { ticket: LoadTicket },
    /// The engine switched to `scene_id` for `ticket`.
    SceneChange { ticket: LoadTicket, scene_id: String },
    /// Loading or rendering for `ticket` failed.
    Error { ticket: LoadTicket, message: String },
}

/// A live engine instance, exclusively owned by one viewer.
///
/// Operations are requests; their outcome arrives later as an
/// [`EngineEvent`].
pub trait PanoramaEngine: Send {
    /// Switch to `scene` with a cross-fade of `fade_ms`.
    fn load_scene(&mut self, scene: &EngineScene, fade_ms: u32, ticket: LoadTicket);

    fn add_marker(&mut self, marker: &EngineHotspot);

    fn clear_markers(&mut self);

    /// `None` stops rotation.
    fn set_auto_rotate(&mut self, speed: Option<f64>);

    fn resize(&mut self);

    fn destroy(&mut self);
}

/// Creates engine instances. The engine starts loading
/// `config.default_scene` immediately and reports it under `ticket`.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        container: &ContainerHandle,
        config: &EngineConfig,
        ticket: LoadTicket,
    ) -> Result<Box<dyn PanoramaEngine>, EngineError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use panotour_core::{TierLimits, TourDocument};
    use serde_json::json;

    fn tour() -> Tour {
        let doc: TourDocument = serde_json::from_value(json!({
            "title": "Gallery",
            "settings": {
                "autorotate": { "enabled": true, "speed": 1.5 },
                "mobile": { "gyro": false },
                "branding": { "logoUrl": "https://x/logo.png", "position": "top-right" }
            },
            "scenes": [
                { "id": "hall", "title": "Hall", "image": { "url": "https://x/hall.jpg" },
                  "initialView": { "yaw": 45, "fov": 90 },
                  "hotspots": [
                    { "id": "door", "type": "scene", "targetSceneId": "room",
                      "position": { "yaw": 10, "pitch": -2 }, "title": "To the room" },
                    { "id": "note", "type": "info", "text": "Opened 1999",
                      "position": { "yaw": -40, "pitch": 3 }, "icon": "info" }
                  ] },
                { "id": "room", "title": "Room", "image": { "id": 7 }, "isDefault": true }
            ]
        }))
        .unwrap();
        Tour::from_document(&doc, &TierLimits::lite()).unwrap()
    }

    #[test]
    fn config_maps_settings_and_default_scene() {
        let config = build_engine_config(&tour()).unwrap();
        assert_eq!(config.default_scene, "room");
        assert_eq!(config.scene_fade_duration, 1000);
        assert_eq!(config.auto_rotate, Some(1.5));
        assert!(!config.orientation_on_by_default);
        assert!(config.touch_pan);
        assert_eq!(config.branding.position, BrandingPosition::TopRight);
        assert_eq!(config.scenes.len(), 2);
    }

    #[test]
    fn hotspots_keyed_by_type() {
        let config = build_engine_config(&tour()).unwrap();
        let hall = &config.scenes[0];
        assert_eq!(hall.hfov, Some(90.0));
        assert_eq!(hall.hot_spots[0].marker, MarkerKind::Scene);
        assert_eq!(hall.hot_spots[0].scene_id.as_deref(), Some("room"));
        assert_eq!(hall.hot_spots[0].text.as_deref(), Some("To the room"));
        assert_eq!(hall.hot_spots[1].marker, MarkerKind::Info);
        assert_eq!(hall.hot_spots[1].text.as_deref(), Some("Opened 1999"));
        assert_eq!(
            hall.hot_spots[1].css_class,
            "panotour-hotspot panotour-hotspot-info"
        );
    }

    #[test]
    fn config_serialises_camel_case() {
        let value = serde_json::to_value(build_engine_config(&tour()).unwrap()).unwrap();
        assert_eq!(value["defaultScene"], "room");
        assert_eq!(value["sceneFadeDuration"], 1000);
        assert_eq!(value["showZoomCtrl"], true);
        assert_eq!(value["scenes"][0]["type"], "equirectangular");
        assert_eq!(value["scenes"][0]["hotSpots"][0]["sceneId"], "room");
        assert_eq!(value["scenes"][1]["mediaId"], 7);
        assert!(value["scenes"][1].get("panorama").is_none());
    }

    #[test]
    fn empty_tour_has_no_config() {
        let mut empty = tour();
        empty.scenes.clear();
        assert_eq!(build_engine_config(&empty), Err(ViewerError::EmptyTour));
    }
}
