#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use panotour_core::{TierLimits, Tour, TourDocument};
use panotour_events::{AnalyticsEvent, AnalyticsSink};
use panotour_viewer::engine::{EngineHotspot, EngineScene};
use panotour_viewer::{
    ContainerHandle, EngineConfig, EngineError, EngineFactory, HostPlatform, LoadTicket,
    ModalContent, NewContext, PanoramaEngine, Viewer,
};
use serde_json::json;

pub const CONTAINER: &str = "panotour-viewer-1";

/// Everything the mock ports observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { default_scene: String, ticket: LoadTicket },
    LoadScene { scene_id: String, ticket: LoadTicket },
    AddMarker(String),
    ClearMarkers,
    SetAutoRotate(Option<f64>),
    Resize,
    DestroyEngine,
    AttachListeners,
    DetachListeners,
    RequestFullscreen,
    ExitFullscreen,
    OpenUrl(String, NewContext),
    OpenModal(ModalContent),
}

pub type Log = Arc<Mutex<Vec<Call>>>;

pub struct MockEngine {
    log: Log,
}

impl PanoramaEngine for MockEngine {
    fn load_scene(&mut self, scene: &EngineScene, _fade_ms: u32, ticket: LoadTicket) {
        self.log.lock().unwrap().push(Call::LoadScene {
            scene_id: scene.id.clone(),
            ticket,
        });
    }

    fn add_marker(&mut self, marker: &EngineHotspot) {
        self.log.lock().unwrap().push(Call::AddMarker(marker.id.clone()));
    }

    fn clear_markers(&mut self) {
        self.log.lock().unwrap().push(Call::ClearMarkers);
    }

    fn set_auto_rotate(&mut self, speed: Option<f64>) {
        self.log.lock().unwrap().push(Call::SetAutoRotate(speed));
    }

    fn resize(&mut self) {
        self.log.lock().unwrap().push(Call::Resize);
    }

    fn destroy(&mut self) {
        self.log.lock().unwrap().push(Call::DestroyEngine);
    }
}

/// Factory producing [`MockEngine`]s. Fails the first `failures` creations.
pub struct MockFactory {
    log: Log,
    failures: Mutex<usize>,
}

impl MockFactory {
    pub fn new(log: Log) -> Arc<Self> {
        Self::failing(log, 0)
    }

    pub fn failing(log: Log, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            log,
            failures: Mutex::new(failures),
        })
    }
}

impl EngineFactory for MockFactory {
    fn create(
        &self,
        _container: &ContainerHandle,
        config: &EngineConfig,
        ticket: LoadTicket,
    ) -> Result<Box<dyn PanoramaEngine>, EngineError> {
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(EngineError::Creation("WebGL unavailable".into()));
        }
        self.log.lock().unwrap().push(Call::Create {
            default_scene: config.default_scene.clone(),
            ticket,
        });
        Ok(Box::new(MockEngine {
            log: self.log.clone(),
        }))
    }
}

pub struct MockPlatform {
    log: Log,
    container: String,
}

impl HostPlatform for MockPlatform {
    fn container_exists(&self, container: &ContainerHandle) -> bool {
        container.0 == self.container
    }

    fn attach_listeners(&mut self, _container: &ContainerHandle) {
        self.log.lock().unwrap().push(Call::AttachListeners);
    }

    fn detach_listeners(&mut self, _container: &ContainerHandle) {
        self.log.lock().unwrap().push(Call::DetachListeners);
    }

    fn request_fullscreen(&mut self, _container: &ContainerHandle) {
        self.log.lock().unwrap().push(Call::RequestFullscreen);
    }

    fn exit_fullscreen(&mut self) {
        self.log.lock().unwrap().push(Call::ExitFullscreen);
    }

    fn open_url(&mut self, url: &str, context: NewContext) {
        self.log.lock().unwrap().push(Call::OpenUrl(url.to_string(), context));
    }

    fn open_modal(&mut self, content: ModalContent) {
        self.log.lock().unwrap().push(Call::OpenModal(content));
    }
}

/// Sink that keeps every recorded event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<AnalyticsEvent>>,
}

impl AnalyticsSink for RecordingSink {
    fn record(&self, event: AnalyticsEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub viewer: Viewer,
    pub log: Log,
    pub sink: Arc<RecordingSink>,
    pub tour: Arc<Tour>,
}

impl Harness {
    pub fn new(tour: Tour) -> Self {
        let log: Log = Arc::default();
        let sink = Arc::new(RecordingSink::default());
        let platform = MockPlatform {
            log: log.clone(),
            container: CONTAINER.to_string(),
        };
        let viewer = Viewer::new(Box::new(platform), sink.clone());
        Self {
            viewer,
            log,
            sink,
            tour: Arc::new(tour),
        }
    }

    pub fn initialize(&mut self) {
        self.viewer
            .initialize(
                ContainerHandle::new(CONTAINER),
                self.tour.clone(),
                MockFactory::new(self.log.clone()),
            )
            .unwrap();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Ticket of the most recent engine request (creation or scene load).
    pub fn last_ticket(&self) -> LoadTicket {
        self.calls()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Create { ticket, .. } | Call::LoadScene { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("an engine request")
    }

    pub fn event_types(&self) -> Vec<String> {
        self.sink
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type.as_str().to_string())
            .collect()
    }
}

/// Three-scene tour: lobby links to hall; hall has link and info hotspots.
pub fn sample_tour() -> Tour {
    let doc: TourDocument = serde_json::from_value(json!({
        "title": "Open House",
        "scenes": [
            { "id": "lobby", "title": "Lobby", "image": { "url": "https://cdn.example/lobby.jpg" },
              "hotspots": [
                { "id": "to-hall", "type": "scene", "targetSceneId": "hall",
                  "position": { "yaw": 90, "pitch": 0 } }
              ] },
            { "id": "hall", "title": "Hall", "image": { "url": "https://cdn.example/hall.jpg" },
              "hotspots": [
                { "id": "brochure", "type": "link", "url": "https://example.com/brochure",
                  "position": { "yaw": 0, "pitch": 5 } },
                { "id": "fireplace", "type": "info", "title": "Fireplace", "text": "Original 1920s",
                  "position": { "yaw": -45, "pitch": -10 } }
              ] },
            { "id": "garden", "title": "Garden", "image": { "url": "https://cdn.example/garden.jpg" } }
        ]
    }))
    .unwrap();
    Tour::from_document(&doc, &TierLimits::lite()).unwrap().with_id(Some(42))
}
