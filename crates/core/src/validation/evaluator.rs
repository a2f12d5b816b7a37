//! Tour evaluator: pure logic, no I/O.
//!
//! Field-level checks run over every tour, scene and hotspot first; the
//! structural checks (cardinality ceilings, duplicate ids, cross-references)
//! run afterwards over the whole document. Nothing short-circuits: the
//! caller always receives the complete list.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use image::ImageFormat;
use regex::Regex;
use validator::ValidateUrl;

use super::rules::{
    MediaLookup, ValidationError, HOTSPOT_ICONS, MAX_AUTOROTATE_SPEED, MAX_FOV, MAX_PITCH,
    MAX_TEXT_LENGTH, MAX_TITLE_LENGTH, MAX_YAW, MIN_AUTOROTATE_SPEED, MIN_FOV, MIN_PITCH, MIN_YAW,
};
use crate::document::{
    HotspotDocument, ImageDocument, SceneDocument, SettingsDocument, TourDocument, ViewDocument,
};
use crate::limits::TierLimits;
use crate::tour::{BrandingPosition, HotspotType, SceneType};

/// Scene and hotspot ids: letters, digits, hyphen, underscore.
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

const TOUR_PATH: &str = "tour";
const SETTINGS_PATH: &str = "settings";

/// Validate a tour draft against every field and structural rule.
///
/// Returns an empty list iff the draft is a valid tour under `limits`.
/// Managed image references are accepted as-is; use
/// [`validate_tour_with_media`] to resolve them.
pub fn validate_tour(draft: &TourDocument, limits: &TierLimits) -> Vec<ValidationError> {
    TourEvaluator::new(limits, None).run(draft)
}

/// Like [`validate_tour`], additionally resolving managed image ids through
/// `media` and checking their MIME type.
pub fn validate_tour_with_media(
    draft: &TourDocument,
    limits: &TierLimits,
    media: &dyn MediaLookup,
) -> Vec<ValidationError> {
    TourEvaluator::new(limits, Some(media)).run(draft)
}

/// Whether `id` is a well-formed scene or hotspot id.
pub fn is_valid_id(id: &str) -> bool {
    ID_RE.is_match(id)
}

/// Whether `url` is an absolute http(s) URL.
pub fn is_well_formed_url(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lower = trimmed.to_ascii_lowercase();
    let has_web_scheme = lower.starts_with("http://") || lower.starts_with("https://");
    has_web_scheme && trimmed.to_string().validate_url()
}

/// Author-facing label for a scene, e.g. `"scene 2 (Lobby)"`.
pub fn scene_path(index: usize, scene: &SceneDocument) -> String {
    match non_blank(scene.title.as_deref()) {
        Some(title) => format!("scene {} ({title})", index + 1),
        None => format!("scene {}", index + 1),
    }
}

/// Author-facing label for a hotspot within a scene path.
pub fn hotspot_path(scene_path: &str, index: usize) -> String {
    format!("{scene_path}: hotspot {}", index + 1)
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn in_range(value: f64, min: f64, max: f64) -> bool {
    (min..=max).contains(&value)
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

struct TourEvaluator<'a> {
    limits: &'a TierLimits,
    media: Option<&'a dyn MediaLookup>,
    errors: Vec<ValidationError>,
}

impl<'a> TourEvaluator<'a> {
    fn new(limits: &'a TierLimits, media: Option<&'a dyn MediaLookup>) -> Self {
        Self {
            limits,
            media,
            errors: Vec::new(),
        }
    }

    fn push(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ValidationError::new(path, message));
    }

    fn run(mut self, draft: &TourDocument) -> Vec<ValidationError> {
        self.check_title(TOUR_PATH, draft.title.as_deref(), "Title", true);
        self.check_settings(&draft.settings);

        for (i, scene) in draft.scenes.iter().enumerate() {
            let path = scene_path(i, scene);
            self.check_scene(&path, scene);
            for (j, hotspot) in scene.hotspots.iter().enumerate() {
                self.check_hotspot(&hotspot_path(&path, j), hotspot);
            }
        }

        self.check_structure(draft);
        self.errors
    }

    // -- Field checks -------------------------------------------------------

    fn check_title(&mut self, path: &str, title: Option<&str>, label: &str, required: bool) {
        match non_blank(title) {
            None if required => self.push(path, format!("{label} is required")),
            None => {}
            Some(t) if t.chars().count() > MAX_TITLE_LENGTH => self.push(
                path,
                format!("{label} must not exceed {MAX_TITLE_LENGTH} characters"),
            ),
            Some(_) => {}
        }
    }

    fn check_id(&mut self, path: &str, id: Option<&str>, entity: &str) {
        match non_blank(id) {
            None => self.push(path, format!("{entity} id is required")),
            Some(id) if !is_valid_id(id) => self.push(
                path,
                format!(
                    "{entity} id '{id}' may only contain letters, numbers, hyphens and underscores"
                ),
            ),
            Some(_) => {}
        }
    }

    fn check_settings(&mut self, settings: &SettingsDocument) {
        let speed = settings.autorotate.speed;
        if !in_range(speed, MIN_AUTOROTATE_SPEED, MAX_AUTOROTATE_SPEED) {
            self.push(
                SETTINGS_PATH,
                format!(
                    "Autorotate speed must be between {MIN_AUTOROTATE_SPEED} and {MAX_AUTOROTATE_SPEED}"
                ),
            );
        }

        let position = &settings.branding.position;
        if BrandingPosition::parse(position).is_none() {
            self.push(
                SETTINGS_PATH,
                format!(
                    "Branding position '{position}' is invalid. Must be one of: {}",
                    BrandingPosition::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );
        }

        if let Some(url) = non_blank(settings.branding.logo_url.as_deref()) {
            if !is_well_formed_url(url) {
                self.push(SETTINGS_PATH, "Branding logo URL is not a valid URL");
            }
        }
    }

    fn check_scene(&mut self, path: &str, scene: &SceneDocument) {
        self.check_id(path, scene.id.as_deref(), "Scene");
        self.check_title(path, scene.title.as_deref(), "Title", true);

        if let Some(scene_type) = scene.scene_type.as_deref() {
            if SceneType::parse(scene_type).is_none() {
                self.push(
                    path,
                    format!(
                        "Scene type '{scene_type}' is not supported. Must be one of: {}",
                        SceneType::ALL
                            .iter()
                            .map(|t| t.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                );
            }
        }

        self.check_image(path, scene.image.as_ref());

        if let Some(view) = &scene.initial_view {
            self.check_view(path, view);
        }
    }

    fn check_image(&mut self, path: &str, image: Option<&ImageDocument>) {
        let url = image.and_then(|i| non_blank(i.url.as_deref()));
        let media_id = image.and_then(|i| i.id);

        if url.is_none() && media_id.is_none() {
            self.push(path, "Panorama image is required (media id or URL)");
            return;
        }

        if let Some(url) = url {
            if !is_well_formed_url(url) {
                self.push(path, "Panorama image URL is not a valid URL");
            }
        }

        if let (Some(id), Some(media)) = (media_id, self.media) {
            match media.mime_type(id) {
                None => self.push(path, format!("Panorama image {id} could not be found")),
                Some(mime) if !is_allowed_image_mime(&mime) => self.push(
                    path,
                    format!("Panorama image must be a JPEG, PNG or WebP file (got {mime})"),
                ),
                Some(_) => {}
            }
        }
    }

    fn check_view(&mut self, path: &str, view: &ViewDocument) {
        if let Some(yaw) = view.yaw {
            if !in_range(yaw, MIN_YAW, MAX_YAW) {
                self.push(path, format!("Initial yaw must be between {MIN_YAW} and {MAX_YAW}"));
            }
        }
        if let Some(pitch) = view.pitch {
            if !in_range(pitch, MIN_PITCH, MAX_PITCH) {
                self.push(
                    path,
                    format!("Initial pitch must be between {MIN_PITCH} and {MAX_PITCH}"),
                );
            }
        }
        if let Some(fov) = view.fov {
            if !in_range(fov, MIN_FOV, MAX_FOV) {
                self.push(
                    path,
                    format!("Initial field of view must be between {MIN_FOV} and {MAX_FOV}"),
                );
            }
        }
    }

    fn check_hotspot(&mut self, path: &str, hotspot: &HotspotDocument) {
        self.check_id(path, hotspot.id.as_deref(), "Hotspot");

        let hotspot_type = match non_blank(hotspot.hotspot_type.as_deref()) {
            None => {
                self.push(path, "Hotspot type is required");
                None
            }
            Some(raw) => match HotspotType::parse(raw) {
                None => {
                    self.push(
                        path,
                        format!(
                            "Hotspot type '{raw}' is not supported. Must be one of: {}",
                            HotspotType::ALL
                                .iter()
                                .map(|t| t.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    );
                    None
                }
                Some(t) if !self.limits.allows(t) => {
                    self.push(
                        path,
                        format!("Hotspot type '{t}' is not available in this edition"),
                    );
                    Some(t)
                }
                Some(t) => Some(t),
            },
        };

        match &hotspot.position {
            None => self.push(path, "Hotspot position is required"),
            Some(position) => {
                match position.yaw {
                    None => self.push(path, "Hotspot yaw is required"),
                    Some(yaw) if !in_range(yaw, MIN_YAW, MAX_YAW) => self.push(
                        path,
                        format!("Hotspot yaw must be between {MIN_YAW} and {MAX_YAW}"),
                    ),
                    Some(_) => {}
                }
                match position.pitch {
                    None => self.push(path, "Hotspot pitch is required"),
                    Some(pitch) if !in_range(pitch, MIN_PITCH, MAX_PITCH) => self.push(
                        path,
                        format!("Hotspot pitch must be between {MIN_PITCH} and {MAX_PITCH}"),
                    ),
                    Some(_) => {}
                }
            }
        }

        self.check_title(path, hotspot.title.as_deref(), "Hotspot title", false);

        if let Some(text) = hotspot.text.as_deref() {
            if text.chars().count() > MAX_TEXT_LENGTH {
                self.push(
                    path,
                    format!("Hotspot text must not exceed {MAX_TEXT_LENGTH} characters"),
                );
            }
        }

        if let Some(icon) = non_blank(hotspot.icon.as_deref()) {
            if !HOTSPOT_ICONS.contains(&icon) {
                self.push(path, format!("Icon '{icon}' is not supported"));
            }
        }

        let url = non_blank(hotspot.url.as_deref());
        match hotspot_type {
            Some(HotspotType::Link) => match url {
                None => self.push(path, "URL is required for link hotspots"),
                Some(u) if !is_well_formed_url(u) => self.push(path, "URL is not a valid URL"),
                Some(_) => {}
            },
            Some(HotspotType::Scene) => {
                if non_blank(hotspot.target_scene_id.as_deref()).is_none() {
                    self.push(path, "Target scene is required for scene hotspots");
                }
            }
            Some(media @ (HotspotType::Image | HotspotType::Video | HotspotType::Audio)) => {
                match url {
                    None => self.push(path, format!("Media URL is required for {media} hotspots")),
                    Some(u) if !is_well_formed_url(u) => {
                        self.push(path, "Media URL is not a valid URL")
                    }
                    Some(_) => {}
                }
            }
            Some(HotspotType::Info) | None => {}
        }
    }

    // -- Structural checks --------------------------------------------------

    fn check_structure(&mut self, draft: &TourDocument) {
        let scene_count = draft.scenes.len();
        if scene_count == 0 {
            self.push(TOUR_PATH, "Tour must contain at least one scene");
        }
        if let Some(max) = self.limits.max_scenes {
            if scene_count > max {
                self.push(
                    TOUR_PATH,
                    format!("Tour has {scene_count} scenes; the limit is {max}"),
                );
            }
        }

        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (i, scene) in draft.scenes.iter().enumerate() {
            let Some(id) = non_blank(scene.id.as_deref()) else {
                continue;
            };
            if let Some(&first) = first_seen.get(id) {
                self.push(
                    &scene_path(i, scene),
                    format!("Duplicate scene id '{id}' (scenes {} and {})", first + 1, i + 1),
                );
            } else {
                first_seen.insert(id, i);
            }
        }

        let default_count = draft.scenes.iter().filter(|s| s.is_default).count();
        if default_count > 1 {
            self.push(TOUR_PATH, "Only one scene may be marked as default");
        }

        let scene_ids: HashSet<&str> = first_seen.keys().copied().collect();
        for (i, scene) in draft.scenes.iter().enumerate() {
            let path = scene_path(i, scene);
            self.check_scene_structure(&path, scene, &scene_ids);
        }
    }

    fn check_scene_structure(
        &mut self,
        path: &str,
        scene: &SceneDocument,
        scene_ids: &HashSet<&str>,
    ) {
        let hotspot_count = scene.hotspots.len();
        if let Some(max) = self.limits.max_hotspots_per_scene {
            if hotspot_count > max {
                self.push(
                    path,
                    format!("Scene has {hotspot_count} hotspots; the limit is {max}"),
                );
            }
        }

        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (j, hotspot) in scene.hotspots.iter().enumerate() {
            if let Some(id) = non_blank(hotspot.id.as_deref()) {
                if let Some(&first) = first_seen.get(id) {
                    self.push(
                        &hotspot_path(path, j),
                        format!(
                            "Duplicate hotspot id '{id}' (hotspots {} and {})",
                            first + 1,
                            j + 1
                        ),
                    );
                } else {
                    first_seen.insert(id, j);
                }
            }

            let is_scene_link = non_blank(hotspot.hotspot_type.as_deref())
                .and_then(HotspotType::parse)
                == Some(HotspotType::Scene);
            if !is_scene_link {
                continue;
            }
            if let Some(target) = non_blank(hotspot.target_scene_id.as_deref()) {
                if !scene_ids.contains(target) {
                    self.push(
                        &hotspot_path(path, j),
                        format!("Target scene '{target}' does not exist in this tour"),
                    );
                }
            }
        }
    }
}

fn is_allowed_image_mime(mime: &str) -> bool {
    matches!(
        ImageFormat::from_mime_type(mime.trim().to_ascii_lowercase()),
        Some(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
