//! Handlers for editing the scenes of a stored tour.
//!
//! Each request applies one editing operation; the whole tour is
//! revalidated before it is saved.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use panotour_core::types::DbId;
use panotour_core::SceneDocument;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::tours::TourResponse;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReorderScenes {
    pub scene_ids: Vec<String>,
}

/// POST /api/v1/tours/{id}/scenes
pub async fn add_scene(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
    Json(scene): Json<SceneDocument>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .tours
        .edit(tour_id, move |tour, limits| tour.add_scene(scene, limits))
        .await?;

    tracing::info!(tour_id, scenes = record.tour.scene_count(), "Scene added");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TourResponse::from(record),
        }),
    ))
}

/// PUT /api/v1/tours/{id}/scenes/order
pub async fn reorder_scenes(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
    Json(input): Json<ReorderScenes>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .tours
        .edit(tour_id, move |tour, limits| {
            tour.reorder_scenes(&input.scene_ids, limits)
        })
        .await?;

    Ok(Json(DataResponse {
        data: TourResponse::from(record),
    }))
}

/// PUT /api/v1/tours/{id}/scenes/{scene_id}
///
/// Replace a scene's fields. Its hotspots are kept; a changed id is
/// followed by every hotspot that targeted the scene.
pub async fn update_scene(
    State(state): State<AppState>,
    Path((tour_id, scene_id)): Path<(DbId, String)>,
    Json(scene): Json<SceneDocument>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .tours
        .edit(tour_id, |tour, limits| {
            tour.update_scene(&scene_id, scene, limits)
        })
        .await?;

    tracing::info!(tour_id, scene_id = %scene_id, "Scene updated");

    Ok(Json(DataResponse {
        data: TourResponse::from(record),
    }))
}

/// DELETE /api/v1/tours/{id}/scenes/{scene_id}
pub async fn remove_scene(
    State(state): State<AppState>,
    Path((tour_id, scene_id)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .tours
        .edit(tour_id, |tour, limits| tour.remove_scene(&scene_id, limits))
        .await?;

    tracing::info!(tour_id, scene_id = %scene_id, "Scene removed");

    Ok(Json(DataResponse {
        data: TourResponse::from(record),
    }))
}
