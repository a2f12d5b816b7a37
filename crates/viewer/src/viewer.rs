//! The viewer driver: owns the engine and platform handles and applies the
//! effects produced by [`reduce`].

use std::collections::VecDeque;
use std::sync::Arc;

use panotour_core::Tour;
use panotour_events::{AnalyticsEvent, AnalyticsSink};
use uuid::Uuid;

use crate::engine::{ContainerHandle, EngineEvent, EngineFactory, PanoramaEngine};
use crate::error::ViewerError;
use crate::platform::{HostPlatform, NewContext, PlatformEvent};
use crate::state::{reduce, ViewerEffect, ViewerInput, ViewerPhase, ViewerState};

/// One embedded tour viewer instance.
///
/// Each instance is independent: it owns its engine and listeners and
/// shares nothing with other viewers on the same page besides the sink.
pub struct Viewer {
    id: Uuid,
    platform: Box<dyn HostPlatform>,
    sink: Arc<dyn AnalyticsSink>,
    factory: Option<Arc<dyn EngineFactory>>,
    container: Option<ContainerHandle>,
    tour: Option<Arc<Tour>>,
    engine: Option<Box<dyn PanoramaEngine>>,
    state: ViewerState,
}

impl Viewer {
    pub fn new(platform: Box<dyn HostPlatform>, sink: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform,
            sink,
            factory: None,
            container: None,
            tour: None,
            engine: None,
            state: ViewerState::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> ViewerPhase {
        self.state.phase
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.state.current_scene.as_deref()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.is_fullscreen
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.state.auto_rotating
    }

    /// The load failure that put the viewer into the error phase.
    pub fn error(&self) -> Option<ViewerError> {
        match self.state.phase {
            ViewerPhase::Error => self.state.last_error.clone().map(ViewerError::Engine),
            _ => None,
        }
    }

    // -- operations ----------------------------------------------------------

    /// Bind the viewer to `container` and start loading the tour's default
    /// scene. Valid on a fresh or destroyed viewer.
    pub fn initialize(
        &mut self,
        container: ContainerHandle,
        tour: Arc<Tour>,
        factory: Arc<dyn EngineFactory>,
    ) -> Result<(), ViewerError> {
        let container_found = self.platform.container_exists(&container);
        let (state, effects) =
            reduce(&self.state, &tour, ViewerInput::Initialize { container_found })?;

        tracing::info!(
            viewer_id = %self.id,
            tour_id = ?tour.id,
            container = %container,
            scenes = tour.scene_count(),
            "Initializing viewer",
        );
        self.container = Some(container);
        self.tour = Some(tour);
        self.factory = Some(factory);
        self.commit(state, effects);
        Ok(())
    }

    pub fn load_scene(&mut self, scene_id: &str) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::LoadScene(scene_id.to_string()))
    }

    pub fn next_scene(&mut self) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::NextScene)
    }

    pub fn previous_scene(&mut self) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::PreviousScene)
    }

    pub fn click_hotspot(&mut self, hotspot_id: &str) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::ClickHotspot(hotspot_id.to_string()))
    }

    pub fn start_auto_rotate(&mut self, speed: f64) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::StartAutoRotate(speed))
    }

    pub fn stop_auto_rotate(&mut self) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::StopAutoRotate)
    }

    pub fn enter_fullscreen(&mut self) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::EnterFullscreen)
    }

    pub fn exit_fullscreen(&mut self) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::ExitFullscreen)
    }

    /// Record a generic user interaction (drag, zoom) for analytics.
    pub fn record_interaction(&mut self) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::Interaction)
    }

    /// Reload after a failure. Only valid in the error phase.
    pub fn retry(&mut self) -> Result<(), ViewerError> {
        self.dispatch(ViewerInput::Retry)
    }

    /// Release the engine and listeners. Idempotent; any later operation
    /// other than [`initialize`](Self::initialize) fails with
    /// [`ViewerError::Destroyed`].
    pub fn destroy(&mut self) {
        if let Err(e) = self.dispatch(ViewerInput::Destroy) {
            tracing::warn!(viewer_id = %self.id, error = %e, "Destroy failed");
        }
        self.tour = None;
        self.factory = None;
    }

    // -- callbacks -----------------------------------------------------------

    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        let input = match event {
            EngineEvent::Load { ticket } => ViewerInput::EngineLoaded { ticket },
            EngineEvent::SceneChange { ticket, scene_id } => {
                tracing::debug!(viewer_id = %self.id, %ticket, scene_id = %scene_id, "Engine scene change");
                ViewerInput::EngineLoaded { ticket }
            }
            EngineEvent::Error { ticket, message } => ViewerInput::EngineFailed { ticket, message },
        };
        self.handle_callback(input);
    }

    pub fn handle_platform_event(&mut self, event: PlatformEvent) {
        let input = match event {
            PlatformEvent::FullscreenEntered => ViewerInput::FullscreenEntered,
            PlatformEvent::FullscreenExited => ViewerInput::FullscreenExited,
            PlatformEvent::FullscreenFailed(message) => ViewerInput::FullscreenFailed(message),
            PlatformEvent::Resized => ViewerInput::Resized,
        };
        self.handle_callback(input);
    }

    fn handle_callback(&mut self, input: ViewerInput) {
        if let Err(e) = self.dispatch(input) {
            tracing::warn!(viewer_id = %self.id, error = %e, "Viewer callback rejected");
        }
    }

    // -- effect application --------------------------------------------------

    fn dispatch(&mut self, input: ViewerInput) -> Result<(), ViewerError> {
        let Some(tour) = self.tour.clone() else {
            return match self.state.phase {
                ViewerPhase::Destroyed if input.is_callback() || input == ViewerInput::Destroy => {
                    Ok(())
                }
                ViewerPhase::Destroyed => Err(ViewerError::Destroyed),
                phase if input == ViewerInput::Destroy => {
                    self.state = self.state.destroyed();
                    tracing::debug!(viewer_id = %self.id, from = %phase, "Destroyed idle viewer");
                    Ok(())
                }
                phase => Err(ViewerError::NotReady {
                    operation: input.operation(),
                    phase,
                }),
            };
        };

        let (state, effects) = reduce(&self.state, &tour, input)?;
        self.commit(state, effects);
        Ok(())
    }

    /// Install `state` and run `effects`. Effects that fail synchronously
    /// (engine creation) feed a follow-up input back through the reducer.
    fn commit(&mut self, state: ViewerState, effects: Vec<ViewerEffect>) {
        self.state = state;
        let mut follow_ups = VecDeque::new();
        for effect in effects {
            if let Some(input) = self.apply(effect) {
                follow_ups.push_back(input);
            }
        }

        while let Some(input) = follow_ups.pop_front() {
            let Some(tour) = self.tour.clone() else { break };
            match reduce(&self.state, &tour, input) {
                Ok((state, effects)) => {
                    self.state = state;
                    for effect in effects {
                        if let Some(input) = self.apply(effect) {
                            follow_ups.push_back(input);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(viewer_id = %self.id, error = %e, "Follow-up input rejected");
                }
            }
        }
    }

    fn apply(&mut self, effect: ViewerEffect) -> Option<ViewerInput> {
        match effect {
            ViewerEffect::AttachListeners => {
                if let Some(container) = &self.container {
                    self.platform.attach_listeners(container);
                }
            }
            ViewerEffect::DetachListeners => {
                if let Some(container) = &self.container {
                    self.platform.detach_listeners(container);
                }
            }
            ViewerEffect::CreateEngine { config, ticket } => {
                let (Some(factory), Some(container)) = (&self.factory, &self.container) else {
                    return Some(ViewerInput::EngineCreateFailed {
                        ticket,
                        message: "No engine factory is configured".to_string(),
                    });
                };
                match factory.create(container, &config, ticket) {
                    Ok(engine) => {
                        if let Some(mut old) = self.engine.replace(engine) {
                            old.destroy();
                        }
                    }
                    Err(e) => {
                        tracing::error!(viewer_id = %self.id, error = %e, "Engine creation failed");
                        return Some(ViewerInput::EngineCreateFailed {
                            ticket,
                            message: e.to_string(),
                        });
                    }
                }
            }
            ViewerEffect::LoadEngineScene {
                scene,
                fade_ms,
                ticket,
            } => {
                tracing::debug!(viewer_id = %self.id, scene_id = %scene.id, %ticket, "Loading scene");
                if let Some(engine) = self.engine.as_mut() {
                    engine.load_scene(&scene, fade_ms, ticket);
                }
            }
            ViewerEffect::RenderMarkers(markers) => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.clear_markers();
                    for marker in &markers {
                        engine.add_marker(marker);
                    }
                }
            }
            ViewerEffect::SetAutoRotate(speed) => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.set_auto_rotate(speed);
                }
            }
            ViewerEffect::Resize => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.resize();
                }
            }
            ViewerEffect::DestroyEngine => {
                if let Some(mut engine) = self.engine.take() {
                    engine.destroy();
                }
            }
            ViewerEffect::RequestFullscreen => {
                if let Some(container) = &self.container {
                    self.platform.request_fullscreen(container);
                }
            }
            ViewerEffect::ExitFullscreen => self.platform.exit_fullscreen(),
            ViewerEffect::OpenUrl(url) => self.platform.open_url(&url, NewContext::NoOpener),
            ViewerEffect::OpenModal(content) => self.platform.open_modal(content),
            ViewerEffect::Track {
                event_type,
                scene_id,
                hotspot_id,
            } => {
                let mut event = AnalyticsEvent::new(event_type)
                    .with_tour(self.tour.as_ref().and_then(|t| t.id))
                    .with_viewer(self.id);
                if let Some(scene_id) = scene_id {
                    event = event.with_scene(scene_id);
                }
                if let Some(hotspot_id) = hotspot_id {
                    event = event.with_hotspot(hotspot_id);
                }
                self.sink.record(event);
            }
            ViewerEffect::Warning(message) => {
                tracing::warn!(viewer_id = %self.id, phase = %self.state.phase, "{message}");
            }
        }
        None
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
    }
}
