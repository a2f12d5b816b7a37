//! Handlers for viewer analytics ingestion and summaries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use panotour_core::types::DbId;
use panotour_events::{AnalyticsEvent, AnalyticsEventType};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// An event reported by an embedded viewer.
#[derive(Debug, Deserialize)]
pub struct RecordAnalyticsEvent {
    pub event_type: AnalyticsEventType,
    pub scene_id: Option<String>,
    pub hotspot_id: Option<String>,
    pub viewer_id: Option<Uuid>,
}

/// POST /api/v1/tours/{id}/analytics
///
/// Publish the event on the analytics bus. Aggregation happens in the
/// background, so the request is acknowledged with 202.
pub async fn record_event(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
    Json(input): Json<RecordAnalyticsEvent>,
) -> AppResult<impl IntoResponse> {
    let record = state.tours.get(tour_id).await?;

    if let Some(scene_id) = &input.scene_id {
        if record.tour.find_scene(scene_id).is_none() {
            return Err(AppError::BadRequest(format!(
                "Scene '{scene_id}' does not exist in tour {tour_id}"
            )));
        }
    }
    if let Some(hotspot_id) = &input.hotspot_id {
        let known = record
            .tour
            .scenes
            .iter()
            .any(|s| s.find_hotspot(hotspot_id).is_some());
        if !known {
            return Err(AppError::BadRequest(format!(
                "Hotspot '{hotspot_id}' does not exist in tour {tour_id}"
            )));
        }
    }

    let mut event = AnalyticsEvent::new(input.event_type).with_tour(Some(tour_id));
    if let Some(scene_id) = input.scene_id {
        event = event.with_scene(scene_id);
    }
    if let Some(hotspot_id) = input.hotspot_id {
        event = event.with_hotspot(hotspot_id);
    }
    if let Some(viewer_id) = input.viewer_id {
        event = event.with_viewer(viewer_id);
    }

    tracing::debug!(tour_id, event_type = event.event_type.as_str(), "Analytics event received");
    state.event_bus.publish(event.clone());

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: event })))
}

/// GET /api/v1/tours/{id}/analytics
pub async fn get_summary(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.tours.get(tour_id).await?;
    let summary = state.analytics.summary(tour_id).await;
    Ok(Json(DataResponse { data: summary }))
}
