//! Scene editing routes, merged into the `/tours` router.

use axum::routing::{post, put};
use axum::Router;

use crate::handlers::scenes;
use crate::state::AppState;

/// ```text
/// POST   /{id}/scenes               -> add_scene
/// PUT    /{id}/scenes/order         -> reorder_scenes
/// PUT    /{id}/scenes/{scene_id}    -> update_scene
/// DELETE /{id}/scenes/{scene_id}    -> remove_scene
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/scenes", post(scenes::add_scene))
        .route("/{id}/scenes/order", put(scenes::reorder_scenes))
        .route(
            "/{id}/scenes/{scene_id}",
            put(scenes::update_scene).delete(scenes::remove_scene),
        )
}
