pub mod analytics;
pub mod health;
pub mod hotspots;
pub mod scenes;
pub mod tours;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /tours                                           list, create
/// /tours/validate                                  validate a draft (POST)
/// /tours/export                                    bulk export (GET)
/// /tours/import                                    import (POST, ?mode=single|batch)
/// /tours/{id}                                      get, replace, delete
/// /tours/{id}/duplicate                            duplicate (POST)
/// /tours/{id}/export                               single-tour export (GET)
/// /tours/{id}/embed                                viewer engine config (GET)
///
/// /tours/{id}/scenes                               add scene (POST)
/// /tours/{id}/scenes/order                         reorder scenes (PUT)
/// /tours/{id}/scenes/{scene_id}                    edit, remove scene
///
/// /tours/{id}/scenes/{scene_id}/hotspots           add hotspot (POST)
/// /tours/{id}/scenes/{scene_id}/hotspots/{hid}     edit, remove hotspot
///
/// /tours/{id}/analytics                            record event, summary
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest(
        "/tours",
        tours::router()
            .merge(scenes::router())
            .merge(hotspots::router())
            .merge(analytics::router()),
    )
}
