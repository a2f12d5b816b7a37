//! Analytics aggregation service.
//!
//! [`AnalyticsRecorder`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and folds every event into an [`AnalyticsStore`]: per-tour counters by
//! event type, scene views and hotspot clicks. It runs as a long-lived
//! background task until cancelled or until the bus is dropped.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use panotour_core::types::{DbId, Timestamp};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::bus::{AnalyticsEvent, AnalyticsEventType};

// ---------------------------------------------------------------------------
// AnalyticsStore
// ---------------------------------------------------------------------------

/// Aggregated analytics for one tour.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    /// Event counts keyed by event type.
    pub totals: BTreeMap<String, u64>,
    /// Loads of each scene, keyed by scene id.
    pub scene_views: BTreeMap<String, u64>,
    /// Clicks on each hotspot, keyed by hotspot id.
    pub hotspot_clicks: BTreeMap<String, u64>,
    pub last_event_at: Option<Timestamp>,
}

impl AnalyticsSummary {
    fn apply(&mut self, event: &AnalyticsEvent) {
        *self
            .totals
            .entry(event.event_type.as_str().to_string())
            .or_default() += 1;

        match event.event_type {
            AnalyticsEventType::SceneLoaded | AnalyticsEventType::SceneChange => {
                if let Some(scene_id) = &event.scene_id {
                    *self.scene_views.entry(scene_id.clone()).or_default() += 1;
                }
            }
            AnalyticsEventType::HotspotClick => {
                if let Some(hotspot_id) = &event.hotspot_id {
                    *self.hotspot_clicks.entry(hotspot_id.clone()).or_default() += 1;
                }
            }
            _ => {}
        }

        self.last_event_at = Some(
            self.last_event_at
                .map_or(event.timestamp, |last| last.max(event.timestamp)),
        );
    }
}

/// In-memory analytics aggregate, keyed by tour.
#[derive(Debug, Default)]
pub struct AnalyticsStore {
    tours: RwLock<HashMap<DbId, AnalyticsSummary>>,
}

impl AnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into its tour's summary. Events without a tour id
    /// are ignored.
    pub async fn apply(&self, event: &AnalyticsEvent) {
        let Some(tour_id) = event.tour_id else {
            tracing::debug!(event_type = event.event_type.as_str(), "Analytics event without tour id ignored");
            return;
        };
        self.tours
            .write()
            .await
            .entry(tour_id)
            .or_default()
            .apply(event);
    }

    /// Summary for `tour_id`; empty when nothing was recorded.
    pub async fn summary(&self, tour_id: DbId) -> AnalyticsSummary {
        self.tours
            .read()
            .await
            .get(&tour_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop the aggregate of a deleted tour.
    pub async fn forget(&self, tour_id: DbId) {
        self.tours.write().await.remove(&tour_id);
    }
}

// ---------------------------------------------------------------------------
// AnalyticsRecorder
// ---------------------------------------------------------------------------

/// Background service that drains the analytics bus into a store.
pub struct AnalyticsRecorder;

impl AnalyticsRecorder {
    /// Run the recorder loop.
    ///
    /// Exits when `cancel` fires or when the channel is closed (i.e. the
    /// [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(
        store: Arc<AnalyticsStore>,
        mut receiver: broadcast::Receiver<AnalyticsEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Analytics recorder cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => store.apply(&event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            skipped = n,
                            "Analytics recorder lagged, some events were not recorded"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Analytics bus closed, recorder shutting down");
                        break;
                    }
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::sink::AnalyticsSink;

    fn event(t: AnalyticsEventType, tour: DbId) -> AnalyticsEvent {
        AnalyticsEvent::new(t).with_tour(Some(tour))
    }

    #[tokio::test]
    async fn store_aggregates_per_tour() {
        let store = AnalyticsStore::new();
        store.apply(&event(AnalyticsEventType::SceneLoaded, 1).with_scene("a")).await;
        store.apply(&event(AnalyticsEventType::SceneChange, 1).with_scene("b")).await;
        store.apply(&event(AnalyticsEventType::SceneChange, 1).with_scene("a")).await;
        store
            .apply(&event(AnalyticsEventType::HotspotClick, 1).with_hotspot("h1"))
            .await;
        store.apply(&event(AnalyticsEventType::Interaction, 2)).await;
        store.apply(&AnalyticsEvent::new(AnalyticsEventType::Interaction)).await;

        let summary = store.summary(1).await;
        assert_eq!(summary.totals["scene_change"], 2);
        assert_eq!(summary.totals["scene_loaded"], 1);
        assert_eq!(summary.scene_views["a"], 2);
        assert_eq!(summary.scene_views["b"], 1);
        assert_eq!(summary.hotspot_clicks["h1"], 1);
        assert!(summary.last_event_at.is_some());

        assert_eq!(store.summary(2).await.totals["interaction"], 1);
        assert_eq!(store.summary(3).await, AnalyticsSummary::default());

        store.forget(1).await;
        assert!(store.summary(1).await.totals.is_empty());
    }

    #[tokio::test]
    async fn recorder_drains_bus_until_closed() {
        let bus = EventBus::default();
        let store = Arc::new(AnalyticsStore::new());
        let handle = tokio::spawn(AnalyticsRecorder::run(
            Arc::clone(&store),
            bus.subscribe(),
            CancellationToken::new(),
        ));

        bus.record(event(AnalyticsEventType::FullscreenEnter, 5));
        bus.record(event(AnalyticsEventType::FullscreenExit, 5));
        drop(bus);

        handle.await.expect("recorder task should finish");
        let summary = store.summary(5).await;
        assert_eq!(summary.totals["fullscreen_enter"], 1);
        assert_eq!(summary.totals["fullscreen_exit"], 1);
    }

    #[tokio::test]
    async fn recorder_stops_on_cancel() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(AnalyticsRecorder::run(
            Arc::new(AnalyticsStore::new()),
            bus.subscribe(),
            cancel.clone(),
        ));
        cancel.cancel();
        handle.await.expect("recorder task should finish");
    }
}
