//! In-process analytics bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans [`AnalyticsEvent`]s out to every subscriber. It is
//! shared via `Arc<EventBus>` between the viewers or handlers that record
//! events and the background [`AnalyticsRecorder`](crate::AnalyticsRecorder).

use chrono::{DateTime, Utc};
use panotour_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::sink::AnalyticsSink;

// ---------------------------------------------------------------------------
// AnalyticsEvent
// ---------------------------------------------------------------------------

/// Kind of viewer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    SceneLoaded,
    SceneChange,
    HotspotClick,
    FullscreenEnter,
    FullscreenExit,
    AutoRotateStart,
    AutoRotateStop,
    Interaction,
}

impl AnalyticsEventType {
    pub const ALL: [AnalyticsEventType; 8] = [
        Self::SceneLoaded,
        Self::SceneChange,
        Self::HotspotClick,
        Self::FullscreenEnter,
        Self::FullscreenExit,
        Self::AutoRotateStart,
        Self::AutoRotateStop,
        Self::Interaction,
    ];

    /// Stable string representation matching serde's `rename_all = "snake_case"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SceneLoaded => "scene_loaded",
            Self::SceneChange => "scene_change",
            Self::HotspotClick => "hotspot_click",
            Self::FullscreenEnter => "fullscreen_enter",
            Self::FullscreenExit => "fullscreen_exit",
            Self::AutoRotateStart => "auto_rotate_start",
            Self::AutoRotateStop => "auto_rotate_stop",
            Self::Interaction => "interaction",
        }
    }
}

/// A single fire-and-forget viewer interaction.
///
/// Constructed via [`AnalyticsEvent::new`] and enriched with the builder
/// methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_type: AnalyticsEventType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour_id: Option<DbId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot_id: Option<String>,

    /// Instance id of the viewer that emitted the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_id: Option<Uuid>,

    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(event_type: AnalyticsEventType) -> Self {
        Self {
            event_type,
            tour_id: None,
            scene_id: None,
            hotspot_id: None,
            viewer_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_tour(mut self, tour_id: Option<DbId>) -> Self {
        self.tour_id = tour_id;
        self
    }

    pub fn with_scene(mut self, scene_id: impl Into<String>) -> Self {
        self.scene_id = Some(scene_id.into());
        self
    }

    pub fn with_hotspot(mut self, hotspot_id: impl Into<String>) -> Self {
        self.hotspot_id = Some(hotspot_id.into());
        self
    }

    pub fn with_viewer(mut self, viewer_id: Uuid) -> Self {
        self.viewer_id = Some(viewer_id);
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out analytics bus.
pub struct EventBus {
    sender: broadcast::Sender<AnalyticsEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Without subscribers the event is silently dropped.
    pub fn publish(&self, event: AnalyticsEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnalyticsEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AnalyticsSink for EventBus {
    fn record(&self, event: AnalyticsEvent) {
        self.publish(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
