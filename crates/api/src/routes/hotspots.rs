//! Hotspot editing routes, merged into the `/tours` router.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::hotspots;
use crate::state::AppState;

/// ```text
/// POST   /{id}/scenes/{scene_id}/hotspots                -> add_hotspot
/// PUT    /{id}/scenes/{scene_id}/hotspots/{hotspot_id}   -> update_hotspot
/// DELETE /{id}/scenes/{scene_id}/hotspots/{hotspot_id}   -> remove_hotspot
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/scenes/{scene_id}/hotspots", post(hotspots::add_hotspot))
        .route(
            "/{id}/scenes/{scene_id}/hotspots/{hotspot_id}",
            put(hotspots::update_hotspot).delete(hotspots::remove_hotspot),
        )
}
