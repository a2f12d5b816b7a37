//! The validated tour model.
//!
//! A [`Tour`] only exists once its document has passed
//! [`validate_tour`](crate::validation::validate_tour): every scene id is
//! unique, every scene-hotspot target resolves, and every hotspot carries
//! exactly the fields its [`HotspotKind`] needs.
//!
//! The model is read-only. Editing operations (`add_scene`, `remove_hotspot`,
//! ...) work on a copy of the tour's document and revalidate the whole tour,
//! so they either return a new consistent `Tour` or fail with the complete
//! error list while the original stays untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::{
    AutorotateDocument, BrandingDocument, HotspotDocument, ImageDocument, MobileDocument,
    PositionDocument, SceneDocument, SettingsDocument, TourDocument, ViewDocument,
};
use crate::error::CoreError;
use crate::limits::TierLimits;
use crate::types::DbId;
use crate::validation::evaluator::non_blank;
use crate::validation::{validate_tour, ValidationError, ValidationErrors};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Panorama projection of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneType {
    #[default]
    Equirectangular,
    Cubemap,
    Multires,
}

impl SceneType {
    pub const ALL: [SceneType; 3] = [Self::Equirectangular, Self::Cubemap, Self::Multires];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equirectangular => "equirectangular",
            Self::Cubemap => "cubemap",
            Self::Multires => "multires",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for SceneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action a hotspot performs when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotspotType {
    Info,
    Link,
    Scene,
    Image,
    Video,
    Audio,
}

impl HotspotType {
    pub const ALL: [HotspotType; 6] = [
        Self::Info,
        Self::Link,
        Self::Scene,
        Self::Image,
        Self::Video,
        Self::Audio,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Link => "link",
            Self::Scene => "scene",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for HotspotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Corner of the viewer that holds the branding logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrandingPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl BrandingPosition {
    pub const ALL: [BrandingPosition; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Spherical position of a hotspot, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub yaw: f64,
    pub pitch: f64,
}

/// Camera view a scene opens with. Missing values fall back to the
/// engine's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialView {
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
    pub fov: Option<f64>,
}

/// Panorama source. At least one of the two is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    pub id: Option<u64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourSettings {
    pub show_thumbnails: bool,
    pub show_zoom: bool,
    pub show_fullscreen: bool,
    pub show_compass: bool,
    pub autorotate: AutorotateSettings,
    pub mobile: MobileSettings,
    pub branding: BrandingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutorotateSettings {
    pub enabled: bool,
    pub speed: f64,
    pub pause_on_hover: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileSettings {
    pub gyro: bool,
    pub touch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandingSettings {
    pub logo_id: Option<u64>,
    pub logo_url: Option<String>,
    pub position: BrandingPosition,
}

/// What a hotspot does, with only the fields that behaviour needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotspotKind {
    Info,
    Link { url: String },
    Scene { target_scene_id: String },
    Image { url: String },
    Video { url: String },
    Audio { url: String },
}

impl HotspotKind {
    pub fn hotspot_type(&self) -> HotspotType {
        match self {
            Self::Info => HotspotType::Info,
            Self::Link { .. } => HotspotType::Link,
            Self::Scene { .. } => HotspotType::Scene,
            Self::Image { .. } => HotspotType::Image,
            Self::Video { .. } => HotspotType::Video,
            Self::Audio { .. } => HotspotType::Audio,
        }
    }

    /// The URL carried by link and media hotspots.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Link { url } | Self::Image { url } | Self::Video { url } | Self::Audio { url } => {
                Some(url)
            }
            Self::Info | Self::Scene { .. } => None,
        }
    }

    pub fn target_scene_id(&self) -> Option<&str> {
        match self {
            Self::Scene { target_scene_id } => Some(target_scene_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: String,
    pub kind: HotspotKind,
    pub position: Position,
    pub title: Option<String>,
    pub text: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub scene_type: SceneType,
    pub image: ImageSource,
    pub initial_view: InitialView,
    pub is_default: bool,
    pub hotspots: Vec<Hotspot>,
}

impl Scene {
    pub fn find_hotspot(&self, hotspot_id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == hotspot_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    /// Assigned by the repository on first save.
    pub id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub settings: TourSettings,
    pub scenes: Vec<Scene>,
}

// ---------------------------------------------------------------------------
// Document conversion
// ---------------------------------------------------------------------------

fn required(value: Option<&str>, path: &str, what: &str) -> Result<String, ValidationError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| ValidationError::new(path, format!("{what} is required")))
}

fn optional(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

impl Tour {
    /// Validate `doc` under `limits` and build the model from it.
    pub fn from_document(doc: &TourDocument, limits: &TierLimits) -> Result<Self, ValidationErrors> {
        let errors = validate_tour(doc, limits);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let scenes = doc
            .scenes
            .iter()
            .enumerate()
            .map(|(i, scene)| scene_from_document(i, scene))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ValidationErrors::from)?;

        Ok(Self {
            id: None,
            title: required(doc.title.as_deref(), "tour", "Title")?,
            description: doc.description.clone().filter(|d| !d.trim().is_empty()),
            settings: settings_from_document(&doc.settings),
            scenes,
        })
    }

    /// The portable document for this tour. The repository id is not part
    /// of the document.
    pub fn to_document(&self) -> TourDocument {
        TourDocument {
            title: Some(self.title.clone()),
            description: self.description.clone(),
            settings: settings_to_document(&self.settings),
            scenes: self.scenes.iter().map(scene_to_document).collect(),
        }
    }

    pub fn with_id(mut self, id: Option<DbId>) -> Self {
        self.id = id;
        self
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn hotspot_count(&self) -> usize {
        self.scenes.iter().map(|s| s.hotspots.len()).sum()
    }
}

fn settings_from_document(doc: &SettingsDocument) -> TourSettings {
    TourSettings {
        show_thumbnails: doc.show_thumbnails,
        show_zoom: doc.show_zoom,
        show_fullscreen: doc.show_fullscreen,
        show_compass: doc.show_compass,
        autorotate: AutorotateSettings {
            enabled: doc.autorotate.enabled,
            speed: doc.autorotate.speed,
            pause_on_hover: doc.autorotate.pause_on_hover,
        },
        mobile: MobileSettings {
            gyro: doc.mobile.gyro,
            touch: doc.mobile.touch,
        },
        branding: BrandingSettings {
            logo_id: doc.branding.logo_id,
            logo_url: optional(doc.branding.logo_url.as_deref()),
            position: BrandingPosition::parse(&doc.branding.position).unwrap_or_default(),
        },
    }
}

fn settings_to_document(settings: &TourSettings) -> SettingsDocument {
    SettingsDocument {
        show_thumbnails: settings.show_thumbnails,
        show_zoom: settings.show_zoom,
        show_fullscreen: settings.show_fullscreen,
        show_compass: settings.show_compass,
        autorotate: AutorotateDocument {
            enabled: settings.autorotate.enabled,
            speed: settings.autorotate.speed,
            pause_on_hover: settings.autorotate.pause_on_hover,
        },
        mobile: MobileDocument {
            gyro: settings.mobile.gyro,
            touch: settings.mobile.touch,
        },
        branding: BrandingDocument {
            logo_id: settings.branding.logo_id,
            logo_url: settings.branding.logo_url.clone(),
            position: settings.branding.position.as_str().to_string(),
        },
    }
}

fn scene_from_document(index: usize, doc: &SceneDocument) -> Result<Scene, ValidationError> {
    let path = crate::validation::scene_path(index, doc);
    let image = doc.image.clone().unwrap_or_default();
    let view = doc.initial_view.clone().unwrap_or_default();

    let hotspots = doc
        .hotspots
        .iter()
        .enumerate()
        .map(|(j, h)| hotspot_from_document(&crate::validation::hotspot_path(&path, j), h))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Scene {
        id: required(doc.id.as_deref(), &path, "Scene id")?,
        title: required(doc.title.as_deref(), &path, "Title")?,
        scene_type: doc
            .scene_type
            .as_deref()
            .and_then(SceneType::parse)
            .unwrap_or_default(),
        image: ImageSource {
            id: image.id,
            url: optional(image.url.as_deref()),
        },
        initial_view: InitialView {
            yaw: view.yaw,
            pitch: view.pitch,
            fov: view.fov,
        },
        is_default: doc.is_default,
        hotspots,
    })
}

fn scene_to_document(scene: &Scene) -> SceneDocument {
    let view = scene.initial_view;
    let has_view = view.yaw.is_some() || view.pitch.is_some() || view.fov.is_some();
    SceneDocument {
        id: Some(scene.id.clone()),
        title: Some(scene.title.clone()),
        scene_type: Some(scene.scene_type.as_str().to_string()),
        image: Some(ImageDocument {
            id: scene.image.id,
            url: scene.image.url.clone(),
        }),
        initial_view: has_view.then_some(ViewDocument {
            yaw: view.yaw,
            pitch: view.pitch,
            fov: view.fov,
        }),
        is_default: scene.is_default,
        hotspots: scene.hotspots.iter().map(hotspot_to_document).collect(),
    }
}

fn hotspot_from_document(path: &str, doc: &HotspotDocument) -> Result<Hotspot, ValidationError> {
    let raw_type = required(doc.hotspot_type.as_deref(), path, "Hotspot type")?;
    let hotspot_type = HotspotType::parse(&raw_type).ok_or_else(|| {
        ValidationError::new(path, format!("Hotspot type '{raw_type}' is not supported"))
    })?;
    let url = || required(doc.url.as_deref(), path, "URL");

    let kind = match hotspot_type {
        HotspotType::Info => HotspotKind::Info,
        HotspotType::Link => HotspotKind::Link { url: url()? },
        HotspotType::Scene => HotspotKind::Scene {
            target_scene_id: required(doc.target_scene_id.as_deref(), path, "Target scene")?,
        },
        HotspotType::Image => HotspotKind::Image { url: url()? },
        HotspotType::Video => HotspotKind::Video { url: url()? },
        HotspotType::Audio => HotspotKind::Audio { url: url()? },
    };

    let position = doc
        .position
        .as_ref()
        .and_then(|p| Some(Position { yaw: p.yaw?, pitch: p.pitch? }))
        .ok_or_else(|| ValidationError::new(path, "Hotspot position is required"))?;

    Ok(Hotspot {
        id: required(doc.id.as_deref(), path, "Hotspot id")?,
        kind,
        position,
        title: optional(doc.title.as_deref()),
        text: doc.text.clone().filter(|t| !t.trim().is_empty()),
        icon: optional(doc.icon.as_deref()),
    })
}

fn hotspot_to_document(hotspot: &Hotspot) -> HotspotDocument {
    HotspotDocument {
        id: Some(hotspot.id.clone()),
        hotspot_type: Some(hotspot.kind.hotspot_type().as_str().to_string()),
        position: Some(PositionDocument {
            yaw: Some(hotspot.position.yaw),
            pitch: Some(hotspot.position.pitch),
        }),
        title: hotspot.title.clone(),
        text: hotspot.text.clone(),
        url: hotspot.kind.url().map(str::to_string),
        target_scene_id: hotspot.kind.target_scene_id().map(str::to_string),
        icon: hotspot.icon.clone(),
    }
}

// ---------------------------------------------------------------------------
// Lookups and traversal
// ---------------------------------------------------------------------------

impl Tour {
    pub fn find_scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == scene_id)
    }

    pub fn scene_index(&self, scene_id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == scene_id)
    }

    /// The scene flagged as default, else the first scene.
    pub fn default_scene(&self) -> Result<&Scene, CoreError> {
        self.scenes
            .iter()
            .find(|s| s.is_default)
            .or_else(|| self.scenes.first())
            .ok_or(CoreError::EmptyTour)
    }

    /// The scene after `current_scene_id`, wrapping from last to first.
    pub fn next_scene(&self, current_scene_id: &str) -> Result<&Scene, CoreError> {
        self.step_scene(current_scene_id, 1)
    }

    /// The scene before `current_scene_id`, wrapping from first to last.
    pub fn previous_scene(&self, current_scene_id: &str) -> Result<&Scene, CoreError> {
        let len = self.scenes.len().max(1);
        self.step_scene(current_scene_id, len - 1)
    }

    fn step_scene(&self, current_scene_id: &str, offset: usize) -> Result<&Scene, CoreError> {
        if self.scenes.is_empty() {
            return Err(CoreError::EmptyTour);
        }
        let index = self
            .scene_index(current_scene_id)
            .ok_or_else(|| CoreError::not_found("Scene", current_scene_id))?;
        Ok(&self.scenes[(index + offset) % self.scenes.len()])
    }
}

// ---------------------------------------------------------------------------
// Editing operations
// ---------------------------------------------------------------------------

impl Tour {
    /// Re-derive a tour from an edited copy of this tour's document.
    fn rebuild(&self, doc: TourDocument, limits: &TierLimits) -> Result<Tour, CoreError> {
        Tour::from_document(&doc, limits)
            .map(|tour| tour.with_id(self.id))
            .map_err(CoreError::Validation)
    }

    fn scene_position(&self, scene_id: &str) -> Result<usize, CoreError> {
        self.scene_index(scene_id)
            .ok_or_else(|| CoreError::not_found("Scene", scene_id))
    }

    fn hotspot_position(&self, scene_index: usize, hotspot_id: &str) -> Result<usize, CoreError> {
        self.scenes[scene_index]
            .hotspots
            .iter()
            .position(|h| h.id == hotspot_id)
            .ok_or_else(|| CoreError::not_found("Hotspot", hotspot_id))
    }

    /// Append a scene. When the new scene is flagged default the flag is
    /// moved from any previous default scene.
    pub fn add_scene(&self, scene: SceneDocument, limits: &TierLimits) -> Result<Tour, CoreError> {
        let mut doc = self.to_document();
        if scene.is_default {
            doc.scenes.iter_mut().for_each(|s| s.is_default = false);
        }
        doc.scenes.push(scene);
        self.rebuild(doc, limits)
    }

    /// Replace a scene's fields, keeping its hotspots. Renaming the scene id
    /// rewrites every scene hotspot that targeted the old id.
    pub fn update_scene(
        &self,
        scene_id: &str,
        mut scene: SceneDocument,
        limits: &TierLimits,
    ) -> Result<Tour, CoreError> {
        let index = self.scene_position(scene_id)?;
        let mut doc = self.to_document();

        scene.hotspots = std::mem::take(&mut doc.scenes[index].hotspots);
        if scene.is_default {
            doc.scenes.iter_mut().for_each(|s| s.is_default = false);
        }

        if let Some(new_id) = non_blank(scene.id.as_deref()) {
            if new_id != scene_id {
                let new_id = new_id.to_string();
                retarget_hotspots(&mut doc, scene_id, &new_id);
                retarget_hotspots_in(&mut scene.hotspots, scene_id, &new_id);
            }
        }

        doc.scenes[index] = scene;
        self.rebuild(doc, limits)
    }

    /// Remove a scene and its hotspots. Rejected while other hotspots
    /// still target it, or when it is the only scene.
    pub fn remove_scene(&self, scene_id: &str, limits: &TierLimits) -> Result<Tour, CoreError> {
        let index = self.scene_position(scene_id)?;
        let mut doc = self.to_document();
        doc.scenes.remove(index);
        self.rebuild(doc, limits)
    }

    /// Put the scenes in the order given by `scene_ids`, which must name
    /// every scene exactly once.
    pub fn reorder_scenes(
        &self,
        scene_ids: &[String],
        limits: &TierLimits,
    ) -> Result<Tour, CoreError> {
        let mut remaining: Vec<SceneDocument> = self.to_document().scenes;
        let mut ordered = Vec::with_capacity(remaining.len());

        for id in scene_ids {
            let pos = remaining
                .iter()
                .position(|s| s.id.as_deref() == Some(id.as_str()))
                .ok_or_else(|| {
                    CoreError::Validation(ValidationErrors::single(
                        "tour",
                        format!("Scene order lists unknown or repeated scene '{id}'"),
                    ))
                })?;
            ordered.push(remaining.remove(pos));
        }
        if !remaining.is_empty() {
            return Err(CoreError::Validation(ValidationErrors::single(
                "tour",
                "Scene order must list every scene exactly once",
            )));
        }

        let mut doc = self.to_document();
        doc.scenes = ordered;
        self.rebuild(doc, limits)
    }

    pub fn add_hotspot(
        &self,
        scene_id: &str,
        hotspot: HotspotDocument,
        limits: &TierLimits,
    ) -> Result<Tour, CoreError> {
        let index = self.scene_position(scene_id)?;
        let mut doc = self.to_document();
        doc.scenes[index].hotspots.push(hotspot);
        self.rebuild(doc, limits)
    }

    pub fn update_hotspot(
        &self,
        scene_id: &str,
        hotspot_id: &str,
        hotspot: HotspotDocument,
        limits: &TierLimits,
    ) -> Result<Tour, CoreError> {
        let index = self.scene_position(scene_id)?;
        let hotspot_index = self.hotspot_position(index, hotspot_id)?;
        let mut doc = self.to_document();
        doc.scenes[index].hotspots[hotspot_index] = hotspot;
        self.rebuild(doc, limits)
    }

    pub fn remove_hotspot(
        &self,
        scene_id: &str,
        hotspot_id: &str,
        limits: &TierLimits,
    ) -> Result<Tour, CoreError> {
        let index = self.scene_position(scene_id)?;
        let hotspot_index = self.hotspot_position(index, hotspot_id)?;
        let mut doc = self.to_document();
        doc.scenes[index].hotspots.remove(hotspot_index);
        self.rebuild(doc, limits)
    }
}

fn retarget_hotspots(doc: &mut TourDocument, old_id: &str, new_id: &str) {
    for scene in &mut doc.scenes {
        retarget_hotspots_in(&mut scene.hotspots, old_id, new_id);
    }
}

fn retarget_hotspots_in(hotspots: &mut [HotspotDocument], old_id: &str, new_id: &str) {
    for hotspot in hotspots {
        if hotspot.target_scene_id.as_deref() == Some(old_id) {
            hotspot.target_scene_id = Some(new_id.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn lite() -> TierLimits {
        TierLimits::lite()
    }

    fn three_scene_tour() -> Tour {
        let doc: TourDocument = serde_json::from_value(json!({
            "title": "Campus",
            "scenes": [
                { "id": "s1", "title": "Gate", "image": { "url": "https://x/1.jpg" },
                  "hotspots": [
                    { "id": "go", "type": "scene", "targetSceneId": "s2",
                      "position": { "yaw": 5, "pitch": 0 } }
                  ] },
                { "id": "s2", "title": "Library", "image": { "url": "https://x/2.jpg" } },
                { "id": "s3", "title": "Hall", "image": { "id": 42 } }
            ]
        }))
        .unwrap();
        Tour::from_document(&doc, &lite()).unwrap()
    }

    fn scene_doc(id: &str) -> SceneDocument {
        serde_json::from_value(json!({
            "id": id,
            "title": format!("Scene {id}"),
            "image": { "url": "https://x/n.jpg" }
        }))
        .unwrap()
    }

    // -- Conversion ---------------------------------------------------------

    #[test]
    fn hotspot_kind_carries_only_its_fields() {
        let tour = three_scene_tour();
        let hotspot = &tour.scenes[0].hotspots[0];
        assert_eq!(
            hotspot.kind,
            HotspotKind::Scene {
                target_scene_id: "s2".into()
            }
        );
        assert_eq!(hotspot.kind.url(), None);
        assert_eq!(tour.scenes[0].scene_type, SceneType::Equirectangular);
    }

    #[test]
    fn document_round_trip_preserves_model() {
        let tour = three_scene_tour();
        let again = Tour::from_document(&tour.to_document(), &lite()).unwrap();
        assert_eq!(again, tour);
    }

    #[test]
    fn invalid_document_returns_all_errors() {
        let doc = TourDocument::default();
        let errors = Tour::from_document(&doc, &lite()).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    // -- Traversal ----------------------------------------------------------

    #[test]
    fn traversal_wraps_around() {
        let tour = three_scene_tour();
        assert_eq!(tour.next_scene("s3").unwrap().id, "s1");
        assert_eq!(tour.previous_scene("s1").unwrap().id, "s3");
        assert_eq!(tour.next_scene("s1").unwrap().id, "s2");
        assert_eq!(tour.previous_scene("s2").unwrap().id, "s1");
    }

    #[test]
    fn traversal_from_unknown_scene_is_not_found() {
        let tour = three_scene_tour();
        assert_matches!(tour.next_scene("nope"), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn default_scene_prefers_flag_then_first() {
        let mut tour = three_scene_tour();
        assert_eq!(tour.default_scene().unwrap().id, "s1");
        tour.scenes[2].is_default = true;
        assert_eq!(tour.default_scene().unwrap().id, "s3");
        tour.scenes.clear();
        assert_matches!(tour.default_scene(), Err(CoreError::EmptyTour));
    }

    #[test]
    fn single_scene_tour_traverses_to_itself() {
        let mut tour = three_scene_tour();
        tour.scenes.truncate(1);
        assert_eq!(tour.next_scene("s1").unwrap().id, "s1");
        assert_eq!(tour.previous_scene("s1").unwrap().id, "s1");
    }

    // -- Editing ------------------------------------------------------------

    #[test]
    fn add_scene_keeps_id_and_appends() {
        let tour = three_scene_tour().with_id(Some(7));
        let edited = tour.add_scene(scene_doc("s4"), &lite()).unwrap();
        assert_eq!(edited.id, Some(7));
        assert_eq!(edited.scenes.len(), 4);
        assert_eq!(edited.scenes[3].id, "s4");
        assert_eq!(tour.scenes.len(), 3);
    }

    #[test]
    fn add_scene_beyond_limit_is_rejected() {
        let tour = three_scene_tour()
            .add_scene(scene_doc("s4"), &lite())
            .unwrap()
            .add_scene(scene_doc("s5"), &lite())
            .unwrap();
        let err = tour.add_scene(scene_doc("s6"), &lite()).unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) => {
            assert_eq!(errors.0[0].message, "Tour has 6 scenes; the limit is 5");
        });
    }

    #[test]
    fn add_default_scene_moves_flag() {
        let mut doc = scene_doc("s4");
        doc.is_default = true;
        let edited = three_scene_tour().add_scene(doc, &lite()).unwrap();
        assert_eq!(edited.default_scene().unwrap().id, "s4");
        assert_eq!(edited.scenes.iter().filter(|s| s.is_default).count(), 1);
    }

    #[test]
    fn remove_targeted_scene_is_rejected() {
        let tour = three_scene_tour();
        let err = tour.remove_scene("s2", &lite()).unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) => {
            assert_eq!(
                errors.0[0].message,
                "Target scene 's2' does not exist in this tour"
            );
        });
    }

    #[test]
    fn remove_untargeted_scene() {
        let edited = three_scene_tour().remove_scene("s3", &lite()).unwrap();
        assert_eq!(edited.scenes.len(), 2);
        assert!(edited.find_scene("s3").is_none());
    }

    #[test]
    fn remove_unknown_scene_is_not_found() {
        assert_matches!(
            three_scene_tour().remove_scene("zz", &lite()),
            Err(CoreError::NotFound { entity: "Scene", .. })
        );
    }

    #[test]
    fn rename_scene_retargets_hotspots() {
        let mut doc = scene_doc("library");
        doc.title = Some("Library".into());
        let edited = three_scene_tour().update_scene("s2", doc, &lite()).unwrap();
        assert_eq!(
            edited.scenes[0].hotspots[0].kind.target_scene_id(),
            Some("library")
        );
        assert!(edited.find_scene("s2").is_none());
    }

    #[test]
    fn reorder_requires_permutation() {
        let tour = three_scene_tour();
        let order: Vec<String> = vec!["s3".into(), "s1".into(), "s2".into()];
        let edited = tour.reorder_scenes(&order, &lite()).unwrap();
        let ids: Vec<_> = edited.scenes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s3", "s1", "s2"]);

        let partial: Vec<String> = vec!["s3".into(), "s1".into()];
        assert_matches!(
            tour.reorder_scenes(&partial, &lite()),
            Err(CoreError::Validation(_))
        );
        let repeated: Vec<String> = vec!["s1".into(), "s1".into(), "s2".into()];
        assert_matches!(
            tour.reorder_scenes(&repeated, &lite()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn hotspot_edits_revalidate() {
        let tour = three_scene_tour();
        let link: HotspotDocument = serde_json::from_value(json!({
            "id": "h1", "type": "link", "position": { "yaw": 0, "pitch": 0 }
        }))
        .unwrap();
        let err = tour.add_hotspot("s2", link, &lite()).unwrap_err();
        assert_matches!(err, CoreError::Validation(errors) => {
            assert_eq!(errors.0[0].message, "URL is required for link hotspots");
        });

        let info: HotspotDocument = serde_json::from_value(json!({
            "id": "h1", "type": "info", "text": "Open 9-5",
            "position": { "yaw": 10, "pitch": 2 }
        }))
        .unwrap();
        let edited = tour.add_hotspot("s2", info.clone(), &lite()).unwrap();
        assert_eq!(edited.scenes[1].hotspots.len(), 1);

        let mut moved = info;
        moved.position = Some(PositionDocument {
            yaw: Some(-20.0),
            pitch: Some(4.0),
        });
        let edited = edited.update_hotspot("s2", "h1", moved, &lite()).unwrap();
        assert_eq!(edited.scenes[1].hotspots[0].position.yaw, -20.0);

        let edited = edited.remove_hotspot("s2", "h1", &lite()).unwrap();
        assert!(edited.scenes[1].hotspots.is_empty());
        assert_matches!(
            edited.remove_hotspot("s2", "h1", &lite()),
            Err(CoreError::NotFound { entity: "Hotspot", .. })
        );
    }

    #[test]
    fn enum_parsing() {
        assert_eq!(HotspotType::parse("video"), Some(HotspotType::Video));
        assert_eq!(HotspotType::parse("Video"), None);
        assert_eq!(SceneType::parse("cubemap"), Some(SceneType::Cubemap));
        assert_eq!(
            BrandingPosition::parse("top-left"),
            Some(BrandingPosition::TopLeft)
        );
        assert_eq!(
            serde_json::to_value(BrandingPosition::BottomLeft).unwrap(),
            json!("bottom-left")
        );
    }
}
