//! Pure state transitions for the viewer runtime.
//!
//! Phases: `Uninitialized -> Loading -> Ready <-> SceneTransition`, with
//! `Error` reachable on load or render failure and `Destroyed` from
//! anywhere. Every user action, engine callback and platform event is a
//! [`ViewerInput`]; [`reduce`] maps the current state and an input to the
//! next state plus the [`ViewerEffect`]s the driver must perform.
//!
//! Scene loads follow "last requested scene wins": each request takes a new
//! [`LoadTicket`] and only the completion of the latest ticket moves the
//! viewer. Completions of superseded requests are ignored, not cancelled.

use std::fmt;

use panotour_core::tour::{HotspotKind, Scene};
use panotour_core::validation::rules::{MAX_AUTOROTATE_SPEED, MIN_AUTOROTATE_SPEED};
use panotour_core::Tour;
use panotour_events::AnalyticsEventType;

use crate::engine::{
    build_engine_config, engine_hotspots, engine_scene, EngineConfig, EngineHotspot, EngineScene,
    LoadTicket, DEFAULT_SCENE_FADE_MS,
};
use crate::error::ViewerError;
use crate::platform::ModalContent;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    Uninitialized,
    Loading,
    Ready,
    SceneTransition,
    Error,
    Destroyed,
}

impl ViewerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::SceneTransition => "in a scene transition",
            Self::Error => "in an error state",
            Self::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for ViewerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub phase: ViewerPhase,
    /// Scene the viewer is showing.
    pub current_scene: Option<String>,
    /// Scene of the in-flight load, if any.
    pub pending_scene: Option<String>,
    /// Ticket of the most recent load request.
    pub latest_ticket: Option<LoadTicket>,
    pub has_engine: bool,
    pub is_fullscreen: bool,
    pub auto_rotating: bool,
    pub auto_rotate_speed: Option<f64>,
    pub last_error: Option<String>,
    next_ticket: u64,
    /// The engine was created for the in-flight load and starts with the
    /// tour's configured rotation.
    fresh_engine: bool,
}

impl ViewerState {
    pub fn new() -> Self {
        Self {
            phase: ViewerPhase::Uninitialized,
            current_scene: None,
            pending_scene: None,
            latest_ticket: None,
            has_engine: false,
            is_fullscreen: false,
            auto_rotating: false,
            auto_rotate_speed: None,
            last_error: None,
            next_ticket: 0,
            fresh_engine: false,
        }
    }

    /// A destroyed state that keeps issuing tickets after this one's.
    pub(crate) fn destroyed(&self) -> Self {
        Self {
            phase: ViewerPhase::Destroyed,
            next_ticket: self.next_ticket,
            ..Self::new()
        }
    }

    fn issue_ticket(&mut self) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.latest_ticket = Some(ticket);
        ticket
    }

    fn is_latest(&self, ticket: LoadTicket) -> bool {
        self.latest_ticket == Some(ticket)
    }

    /// Scene that navigation is relative to: the requested scene while a
    /// transition is in flight, otherwise the shown scene.
    fn navigation_base(&self) -> Option<&str> {
        self.pending_scene
            .as_deref()
            .or(self.current_scene.as_deref())
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Inputs and effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerInput {
    Initialize { container_found: bool },
    LoadScene(String),
    NextScene,
    PreviousScene,
    ClickHotspot(String),
    StartAutoRotate(f64),
    StopAutoRotate,
    EnterFullscreen,
    ExitFullscreen,
    Interaction,
    Retry,
    Destroy,

    // Engine callbacks.
    EngineLoaded { ticket: LoadTicket },
    EngineCreateFailed { ticket: LoadTicket, message: String },
    EngineFailed { ticket: LoadTicket, message: String },

    // Platform callbacks.
    FullscreenEntered,
    FullscreenExited,
    FullscreenFailed(String),
    Resized,
}

impl ViewerInput {
    /// Operation name used in error messages.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::LoadScene(_) => "load a scene",
            Self::NextScene => "go to the next scene",
            Self::PreviousScene => "go to the previous scene",
            Self::ClickHotspot(_) => "click a hotspot",
            Self::StartAutoRotate(_) => "start auto-rotation",
            Self::StopAutoRotate => "stop auto-rotation",
            Self::EnterFullscreen => "enter fullscreen",
            Self::ExitFullscreen => "exit fullscreen",
            Self::Interaction => "record an interaction",
            Self::Retry => "retry",
            Self::Destroy => "destroy",
            Self::EngineLoaded { .. }
            | Self::EngineCreateFailed { .. }
            | Self::EngineFailed { .. } => "handle an engine event",
            Self::FullscreenEntered
            | Self::FullscreenExited
            | Self::FullscreenFailed(_)
            | Self::Resized => "handle a platform event",
        }
    }

    /// Whether the input is an asynchronous callback rather than a call.
    pub fn is_callback(&self) -> bool {
        matches!(
            self,
            Self::EngineLoaded { .. }
                | Self::EngineCreateFailed { .. }
                | Self::EngineFailed { .. }
                | Self::FullscreenEntered
                | Self::FullscreenExited
                | Self::FullscreenFailed(_)
                | Self::Resized
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEffect {
    AttachListeners,
    DetachListeners,
    CreateEngine {
        config: EngineConfig,
        ticket: LoadTicket,
    },
    LoadEngineScene {
        scene: EngineScene,
        fade_ms: u32,
        ticket: LoadTicket,
    },
    /// Replace all markers with those of the shown scene.
    RenderMarkers(Vec<EngineHotspot>),
    SetAutoRotate(Option<f64>),
    Resize,
    DestroyEngine,
    RequestFullscreen,
    ExitFullscreen,
    OpenUrl(String),
    OpenModal(ModalContent),
    Track {
        event_type: AnalyticsEventType,
        scene_id: Option<String>,
        hotspot_id: Option<String>,
    },
    Warning(String),
}

impl ViewerEffect {
    fn track(event_type: AnalyticsEventType, scene_id: Option<&str>) -> Self {
        Self::Track {
            event_type,
            scene_id: scene_id.map(str::to_string),
            hotspot_id: None,
        }
    }
}

/// Clamp a requested rotation speed to the configurable bounds. Non-finite
/// requests fall back to `fallback`.
pub fn clamp_auto_rotate_speed(speed: f64, fallback: f64) -> f64 {
    let speed = if speed.is_finite() { speed } else { fallback };
    speed.clamp(MIN_AUTOROTATE_SPEED, MAX_AUTOROTATE_SPEED)
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

type Transition = Result<(ViewerState, Vec<ViewerEffect>), ViewerError>;

fn not_ready(input: &ViewerInput, phase: ViewerPhase) -> ViewerError {
    ViewerError::NotReady {
        operation: input.operation(),
        phase,
    }
}

pub fn reduce(state: &ViewerState, tour: &Tour, input: ViewerInput) -> Transition {
    use ViewerPhase::*;

    if state.phase == Destroyed {
        match &input {
            ViewerInput::Initialize { .. } => {}
            ViewerInput::Destroy => return Ok((state.clone(), Vec::new())),
            i if i.is_callback() => return Ok((state.clone(), Vec::new())),
            _ => return Err(ViewerError::Destroyed),
        }
    }

    let mut next = state.clone();
    let mut fx = Vec::new();

    match input {
        ViewerInput::Initialize { container_found } => {
            if !matches!(state.phase, Uninitialized | Destroyed) {
                return Err(not_ready(&input, state.phase));
            }
            if !container_found {
                return Err(ViewerError::MissingContainer);
            }
            let config = build_engine_config(tour)?;
            let ticket = next.issue_ticket();
            next.phase = Loading;
            next.current_scene = None;
            next.pending_scene = Some(config.default_scene.clone());
            next.has_engine = true;
            next.fresh_engine = true;
            next.is_fullscreen = false;
            next.auto_rotating = false;
            next.auto_rotate_speed = None;
            next.last_error = None;
            fx.push(ViewerEffect::AttachListeners);
            fx.push(ViewerEffect::CreateEngine { config, ticket });
        }

        ViewerInput::LoadScene(ref scene_id) => {
            if !matches!(state.phase, Ready | SceneTransition) {
                return Err(not_ready(&input, state.phase));
            }
            request_scene(&mut next, &mut fx, tour, scene_id);
        }

        ViewerInput::NextScene | ViewerInput::PreviousScene => {
            if !matches!(state.phase, Ready | SceneTransition) {
                return Err(not_ready(&input, state.phase));
            }
            let Some(base) = state.navigation_base() else {
                return Err(not_ready(&input, state.phase));
            };
            let target = if input == ViewerInput::NextScene {
                tour.next_scene(base)
            } else {
                tour.previous_scene(base)
            };
            match target {
                Ok(scene) => {
                    let scene_id = scene.id.clone();
                    request_scene(&mut next, &mut fx, tour, &scene_id);
                }
                Err(e) => fx.push(ViewerEffect::Warning(format!("Cannot navigate: {e}"))),
            }
        }

        ViewerInput::ClickHotspot(hotspot_id) => {
            if state.phase != Ready {
                fx.push(ViewerEffect::Warning(format!(
                    "Ignoring click on hotspot '{hotspot_id}' while the viewer is {}",
                    state.phase
                )));
                return Ok((next, fx));
            }
            dispatch_hotspot(&mut next, &mut fx, tour, &hotspot_id);
        }

        ViewerInput::StartAutoRotate(speed) => {
            if !matches!(state.phase, Ready | SceneTransition) {
                return Err(not_ready(&input, state.phase));
            }
            let speed = clamp_auto_rotate_speed(speed, tour.settings.autorotate.speed);
            if !state.auto_rotating {
                fx.push(ViewerEffect::track(
                    AnalyticsEventType::AutoRotateStart,
                    state.current_scene.as_deref(),
                ));
            }
            next.auto_rotating = true;
            next.auto_rotate_speed = Some(speed);
            fx.push(ViewerEffect::SetAutoRotate(Some(speed)));
        }

        ViewerInput::StopAutoRotate => {
            if !matches!(state.phase, Ready | SceneTransition) {
                return Err(not_ready(&input, state.phase));
            }
            if state.auto_rotating {
                fx.push(ViewerEffect::track(
                    AnalyticsEventType::AutoRotateStop,
                    state.current_scene.as_deref(),
                ));
            }
            next.auto_rotating = false;
            next.auto_rotate_speed = None;
            fx.push(ViewerEffect::SetAutoRotate(None));
        }

        ViewerInput::EnterFullscreen => {
            if !matches!(state.phase, Ready | SceneTransition) {
                return Err(not_ready(&input, state.phase));
            }
            if !state.is_fullscreen {
                fx.push(ViewerEffect::RequestFullscreen);
            }
        }

        ViewerInput::ExitFullscreen => {
            if state.phase == Uninitialized {
                return Err(not_ready(&input, state.phase));
            }
            if state.is_fullscreen {
                fx.push(ViewerEffect::ExitFullscreen);
            }
        }

        ViewerInput::Interaction => {
            if state.phase == Ready {
                fx.push(ViewerEffect::track(
                    AnalyticsEventType::Interaction,
                    state.current_scene.as_deref(),
                ));
            }
        }

        ViewerInput::Retry => {
            if state.phase != Error {
                return Err(not_ready(&input, state.phase));
            }
            let target = match state.navigation_base() {
                Some(id) if tour.find_scene(id).is_some() => id.to_string(),
                _ => tour
                    .default_scene()
                    .map_err(|_| ViewerError::EmptyTour)?
                    .id
                    .clone(),
            };
            let ticket = next.issue_ticket();
            next.phase = Loading;
            next.pending_scene = Some(target.clone());
            next.last_error = None;

            if state.has_engine {
                if let Some(scene) = tour.find_scene(&target) {
                    fx.push(ViewerEffect::LoadEngineScene {
                        scene: engine_scene(scene),
                        fade_ms: DEFAULT_SCENE_FADE_MS,
                        ticket,
                    });
                }
            } else {
                let mut config = build_engine_config(tour)?;
                config.default_scene = target;
                next.has_engine = true;
                next.fresh_engine = true;
                fx.push(ViewerEffect::CreateEngine { config, ticket });
            }
        }

        ViewerInput::Destroy => {
            next.phase = Destroyed;
            next.current_scene = None;
            next.pending_scene = None;
            next.latest_ticket = None;
            next.is_fullscreen = false;
            next.auto_rotating = false;
            next.auto_rotate_speed = None;
            next.last_error = None;
            next.fresh_engine = false;
            if state.is_fullscreen {
                fx.push(ViewerEffect::ExitFullscreen);
            }
            if state.phase != Uninitialized {
                fx.push(ViewerEffect::DetachListeners);
            }
            if state.has_engine {
                fx.push(ViewerEffect::DestroyEngine);
            }
            next.has_engine = false;
        }

        ViewerInput::EngineLoaded { ticket } => {
            complete_load(state, &mut next, &mut fx, tour, ticket);
        }

        ViewerInput::EngineCreateFailed { ticket, message } => {
            if state.is_latest(ticket) {
                next.has_engine = false;
            }
            fail_load(state, &mut next, &mut fx, ticket, message);
        }

        ViewerInput::EngineFailed { ticket, message } => {
            fail_load(state, &mut next, &mut fx, ticket, message);
        }

        ViewerInput::FullscreenEntered => {
            if !state.is_fullscreen && state.has_engine {
                next.is_fullscreen = true;
                fx.push(ViewerEffect::Resize);
                fx.push(ViewerEffect::track(
                    AnalyticsEventType::FullscreenEnter,
                    state.current_scene.as_deref(),
                ));
            }
        }

        ViewerInput::FullscreenExited => {
            if state.is_fullscreen {
                next.is_fullscreen = false;
                fx.push(ViewerEffect::Resize);
                fx.push(ViewerEffect::track(
                    AnalyticsEventType::FullscreenExit,
                    state.current_scene.as_deref(),
                ));
            }
        }

        ViewerInput::FullscreenFailed(message) => {
            fx.push(ViewerEffect::Warning(format!(
                "Fullscreen request failed: {message}"
            )));
        }

        ViewerInput::Resized => {
            if state.has_engine {
                fx.push(ViewerEffect::Resize);
            }
        }
    }

    Ok((next, fx))
}

/// Start a transition to `scene_id`, superseding any in-flight one.
fn request_scene(next: &mut ViewerState, fx: &mut Vec<ViewerEffect>, tour: &Tour, scene_id: &str) {
    let Some(scene) = tour.find_scene(scene_id) else {
        fx.push(ViewerEffect::Warning(format!(
            "Scene '{scene_id}' does not exist in this tour"
        )));
        return;
    };

    if next.phase == ViewerPhase::Ready && next.current_scene.as_deref() == Some(scene_id) {
        return;
    }

    let ticket = next.issue_ticket();
    next.phase = ViewerPhase::SceneTransition;
    next.pending_scene = Some(scene.id.clone());
    fx.push(ViewerEffect::LoadEngineScene {
        scene: engine_scene(scene),
        fade_ms: DEFAULT_SCENE_FADE_MS,
        ticket,
    });
}

fn dispatch_hotspot(
    next: &mut ViewerState,
    fx: &mut Vec<ViewerEffect>,
    tour: &Tour,
    hotspot_id: &str,
) {
    let scene = next
        .current_scene
        .as_deref()
        .and_then(|id| tour.find_scene(id));
    let Some(hotspot) = scene.and_then(|s| s.find_hotspot(hotspot_id)) else {
        fx.push(ViewerEffect::Warning(format!(
            "Hotspot '{hotspot_id}' is not in the current scene"
        )));
        return;
    };

    fx.push(ViewerEffect::Track {
        event_type: AnalyticsEventType::HotspotClick,
        scene_id: next.current_scene.clone(),
        hotspot_id: Some(hotspot.id.clone()),
    });

    match &hotspot.kind {
        HotspotKind::Scene { target_scene_id } => {
            let target = target_scene_id.clone();
            request_scene(next, fx, tour, &target);
        }
        HotspotKind::Link { url } => fx.push(ViewerEffect::OpenUrl(url.clone())),
        HotspotKind::Info
        | HotspotKind::Image { .. }
        | HotspotKind::Video { .. }
        | HotspotKind::Audio { .. } => {
            fx.push(ViewerEffect::OpenModal(ModalContent::for_hotspot(hotspot)));
        }
    }
}

fn complete_load(
    state: &ViewerState,
    next: &mut ViewerState,
    fx: &mut Vec<ViewerEffect>,
    tour: &Tour,
    ticket: LoadTicket,
) {
    let in_flight = matches!(
        state.phase,
        ViewerPhase::Loading | ViewerPhase::SceneTransition
    );
    if !in_flight || !state.is_latest(ticket) {
        fx.push(ViewerEffect::Warning(format!(
            "Ignoring stale engine completion for ticket {ticket}"
        )));
        return;
    }

    let Some(scene) = state
        .pending_scene
        .as_deref()
        .and_then(|id| tour.find_scene(id))
    else {
        fx.push(ViewerEffect::Warning(format!(
            "Completed load for ticket {ticket} has no scene"
        )));
        return;
    };

    next.phase = ViewerPhase::Ready;
    next.current_scene = Some(scene.id.clone());
    next.pending_scene = None;
    next.fresh_engine = false;
    fx.push(ViewerEffect::RenderMarkers(engine_hotspots(scene)));

    if state.fresh_engine {
        apply_configured_rotation(next, tour);
    }
    if state.phase == ViewerPhase::Loading {
        fx.push(ViewerEffect::track(AnalyticsEventType::SceneLoaded, Some(scene.id.as_str())));
    } else {
        fx.push(ViewerEffect::track(AnalyticsEventType::SceneChange, Some(scene.id.as_str())));
    }
}

/// Record the rotation a newly created engine starts with. A reused engine
/// keeps whatever rotation it was last told.
fn apply_configured_rotation(next: &mut ViewerState, tour: &Tour) {
    let autorotate = tour.settings.autorotate;
    next.auto_rotating = autorotate.enabled;
    next.auto_rotate_speed = autorotate.enabled.then_some(autorotate.speed);
}

fn fail_load(
    state: &ViewerState,
    next: &mut ViewerState,
    fx: &mut Vec<ViewerEffect>,
    ticket: LoadTicket,
    message: String,
) {
    let active = matches!(
        state.phase,
        ViewerPhase::Loading | ViewerPhase::SceneTransition | ViewerPhase::Ready
    );
    if !active || !state.is_latest(ticket) {
        fx.push(ViewerEffect::Warning(format!(
            "Ignoring stale engine failure for ticket {ticket}: {message}"
        )));
        return;
    }
    fx.push(ViewerEffect::Warning(format!("Panorama failed to load: {message}")));
    next.phase = ViewerPhase::Error;
    next.last_error = Some(message);
}

/// The scene currently shown, looked up in `tour`.
pub fn current_scene<'a>(state: &ViewerState, tour: &'a Tour) -> Option<&'a Scene> {
    state
        .current_scene
        .as_deref()
        .and_then(|id| tour.find_scene(id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
