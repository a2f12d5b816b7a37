//! Portable tour documents.
//!
//! These are the loose, serde-facing shapes of a tour as it appears in the
//! authoring forms and in import/export files. Every field an author can get
//! wrong is optional or kept as a raw string so that a bad value survives
//! parsing and is reported by [`crate::validation`] instead of failing the
//! whole document. A validated [`crate::tour::Tour`] converts back into a
//! document with [`crate::tour::Tour::to_document`].
//!
//! Field order in these structs is the field order of exported JSON.

use serde::{Deserialize, Serialize};

/// Default autorotate speed when a document does not specify one.
pub const DEFAULT_AUTOROTATE_SPEED: f64 = 0.5;

/// Default branding logo corner.
pub const DEFAULT_BRANDING_POSITION: &str = "bottom-right";

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ---------------------------------------------------------------------------
// Tour
// ---------------------------------------------------------------------------

/// A complete tour as authored or exchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: SettingsDocument,
    #[serde(default)]
    pub scenes: Vec<SceneDocument>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Viewer settings. Missing keys take the plugin defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsDocument {
    pub show_thumbnails: bool,
    pub show_zoom: bool,
    pub show_fullscreen: bool,
    pub show_compass: bool,
    pub autorotate: AutorotateDocument,
    pub mobile: MobileDocument,
    pub branding: BrandingDocument,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            show_thumbnails: true,
            show_zoom: true,
            show_fullscreen: true,
            show_compass: false,
            autorotate: AutorotateDocument::default(),
            mobile: MobileDocument::default(),
            branding: BrandingDocument::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutorotateDocument {
    pub enabled: bool,
    pub speed: f64,
    pub pause_on_hover: bool,
}

impl Default for AutorotateDocument {
    fn default() -> Self {
        Self {
            enabled: false,
            speed: DEFAULT_AUTOROTATE_SPEED,
            pause_on_hover: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileDocument {
    #[serde(default = "default_true")]
    pub gyro: bool,
    #[serde(default = "default_true")]
    pub touch: bool,
}

impl Default for MobileDocument {
    fn default() -> Self {
        Self {
            gyro: true,
            touch: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandingDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub position: String,
}

impl Default for BrandingDocument {
    fn default() -> Self {
        Self {
            logo_id: None,
            logo_url: None,
            position: DEFAULT_BRANDING_POSITION.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scene_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_view: Option<ViewDocument>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_default: bool,
    #[serde(default)]
    pub hotspots: Vec<HotspotDocument>,
}

/// Panorama source: a managed media id, a direct URL, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<f64>,
}

// ---------------------------------------------------------------------------
// Hotspot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub hotspot_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "description", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_scene_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_settings_take_defaults() {
        let doc: TourDocument = serde_json::from_value(json!({ "title": "Demo" })).unwrap();
        assert_eq!(doc.settings, SettingsDocument::default());
        assert!(doc.settings.mobile.gyro);
        assert_eq!(doc.settings.branding.position, "bottom-right");
        assert!(doc.scenes.is_empty());
    }

    #[test]
    fn partial_settings_keep_remaining_defaults() {
        let doc: TourDocument = serde_json::from_value(json!({
            "settings": { "showCompass": true, "autorotate": { "enabled": true } }
        }))
        .unwrap();
        assert!(doc.settings.show_compass);
        assert!(doc.settings.show_zoom);
        assert!(doc.settings.autorotate.enabled);
        assert_eq!(doc.settings.autorotate.speed, DEFAULT_AUTOROTATE_SPEED);
    }

    #[test]
    fn hotspot_description_is_an_alias_for_text() {
        let hotspot: HotspotDocument = serde_json::from_value(json!({
            "id": "h1",
            "type": "info",
            "description": "Reception desk"
        }))
        .unwrap();
        assert_eq!(hotspot.text.as_deref(), Some("Reception desk"));
    }

    #[test]
    fn unknown_types_survive_parsing() {
        let scene: SceneDocument =
            serde_json::from_value(json!({ "id": "s1", "type": "fisheye" })).unwrap();
        assert_eq!(scene.scene_type.as_deref(), Some("fisheye"));
    }

    #[test]
    fn default_flag_is_omitted_when_false() {
        let scene = SceneDocument {
            id: Some("s1".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&scene).unwrap();
        assert!(value.get("isDefault").is_none());
        assert_eq!(value["hotspots"], json!([]));
    }
}
