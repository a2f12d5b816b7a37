//! Route definitions for tours, mounted at `/tours`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tours;
use crate::state::AppState;

/// ```text
/// GET    /                -> list_tours
/// POST   /                -> create_tour
/// POST   /validate        -> validate_tour
/// GET    /export          -> export_all_tours
/// POST   /import          -> import_tours
/// GET    /{id}            -> get_tour
/// PUT    /{id}            -> update_tour
/// DELETE /{id}            -> delete_tour
/// POST   /{id}/duplicate  -> duplicate_tour
/// GET    /{id}/export     -> export_tour
/// GET    /{id}/embed      -> embed_config
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tours::list_tours).post(tours::create_tour))
        .route("/validate", post(tours::validate_tour))
        .route("/export", get(tours::export_all_tours))
        .route("/import", post(tours::import_tours))
        .route(
            "/{id}",
            get(tours::get_tour)
                .put(tours::update_tour)
                .delete(tours::delete_tour),
        )
        .route("/{id}/duplicate", post(tours::duplicate_tour))
        .route("/{id}/export", get(tours::export_tour))
        .route("/{id}/embed", get(tours::embed_config))
}
