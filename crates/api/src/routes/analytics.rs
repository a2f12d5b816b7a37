//! Viewer analytics routes, merged into the `/tours` router.

use axum::routing::get;
use axum::Router;

use crate::handlers::analytics;
use crate::state::AppState;

/// ```text
/// POST /{id}/analytics   -> record_event
/// GET  /{id}/analytics   -> get_summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}/analytics",
        get(analytics::get_summary).post(analytics::record_event),
    )
}
