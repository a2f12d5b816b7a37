use std::sync::Arc;

use panotour_core::{TourRepository, TourService};
use panotour_events::{AnalyticsStore, EventBus};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, absent when tours are kept in memory.
    pub pool: Option<panotour_db::DbPool>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Tour authoring over the configured repository.
    pub tours: Arc<TourService>,
    /// Bus that viewer analytics events are published on.
    pub event_bus: Arc<EventBus>,
    /// Aggregated analytics, fed by the recorder task.
    pub analytics: Arc<AnalyticsStore>,
}

impl AppState {
    /// Assemble the state around a tour repository. The edition limits come
    /// from `config`.
    pub fn new(
        config: ServerConfig,
        repo: Arc<dyn TourRepository>,
        pool: Option<panotour_db::DbPool>,
    ) -> Self {
        let tours = TourService::new(repo, config.limits.clone());
        Self {
            pool,
            config: Arc::new(config),
            tours: Arc::new(tours),
            event_bus: Arc::new(EventBus::default()),
            analytics: Arc::new(AnalyticsStore::new()),
        }
    }
}
