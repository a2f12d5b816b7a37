//! Handlers for editing the hotspots of a scene.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use panotour_core::types::DbId;
use panotour_core::HotspotDocument;

use crate::error::AppResult;
use crate::handlers::tours::TourResponse;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/tours/{id}/scenes/{scene_id}/hotspots
pub async fn add_hotspot(
    State(state): State<AppState>,
    Path((tour_id, scene_id)): Path<(DbId, String)>,
    Json(hotspot): Json<HotspotDocument>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .tours
        .edit(tour_id, |tour, limits| {
            tour.add_hotspot(&scene_id, hotspot, limits)
        })
        .await?;

    tracing::info!(tour_id, scene_id = %scene_id, "Hotspot added");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TourResponse::from(record),
        }),
    ))
}

/// PUT /api/v1/tours/{id}/scenes/{scene_id}/hotspots/{hotspot_id}
pub async fn update_hotspot(
    State(state): State<AppState>,
    Path((tour_id, scene_id, hotspot_id)): Path<(DbId, String, String)>,
    Json(hotspot): Json<HotspotDocument>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .tours
        .edit(tour_id, |tour, limits| {
            tour.update_hotspot(&scene_id, &hotspot_id, hotspot, limits)
        })
        .await?;

    Ok(Json(DataResponse {
        data: TourResponse::from(record),
    }))
}

/// DELETE /api/v1/tours/{id}/scenes/{scene_id}/hotspots/{hotspot_id}
pub async fn remove_hotspot(
    State(state): State<AppState>,
    Path((tour_id, scene_id, hotspot_id)): Path<(DbId, String, String)>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .tours
        .edit(tour_id, |tour, limits| {
            tour.remove_hotspot(&scene_id, &hotspot_id, limits)
        })
        .await?;

    tracing::info!(tour_id, scene_id = %scene_id, hotspot_id = %hotspot_id, "Hotspot removed");

    Ok(Json(DataResponse {
        data: TourResponse::from(record),
    }))
}
