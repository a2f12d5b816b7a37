//! Handlers for tour CRUD, validation, import/export and embedding.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use panotour_core::error::CoreError;
use panotour_core::types::{DbId, Timestamp};
use panotour_core::{TourDocument, TourFilter, TourRecord, ValidationError};
use panotour_viewer::{build_engine_config, ViewerError};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// A stored tour with its document.
#[derive(Debug, Serialize)]
pub struct TourResponse {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub scene_count: usize,
    pub hotspot_count: usize,
    pub config: TourDocument,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<TourRecord> for TourResponse {
    fn from(record: TourRecord) -> Self {
        Self {
            id: record.id,
            scene_count: record.tour.scene_count(),
            hotspot_count: record.tour.hotspot_count(),
            config: record.tour.to_document(),
            title: record.tour.title,
            description: record.tour.description,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// List entry: a tour without its document.
#[derive(Debug, Serialize)]
pub struct TourSummary {
    pub id: DbId,
    pub title: String,
    pub scene_count: usize,
    pub hotspot_count: usize,
    pub updated_at: Timestamp,
}

impl From<TourRecord> for TourSummary {
    fn from(record: TourRecord) -> Self {
        Self {
            id: record.id,
            scene_count: record.tour.scene_count(),
            hotspot_count: record.tour.hotspot_count(),
            title: record.tour.title,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub created: Vec<TourResponse>,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Import every valid tour, reporting the rest.
    #[default]
    Batch,
    /// Import exactly one tour; any error rejects the whole request.
    Single,
}

#[derive(Debug, Deserialize)]
pub struct ImportParams {
    #[serde(default)]
    pub mode: ImportMode,
}

/// JSON download with an attachment filename.
fn json_attachment(filename: String, body: String) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "application/json".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/tours
///
/// List tours, optionally filtered by `?search=` with `?limit=&offset=`.
pub async fn list_tours(
    State(state): State<AppState>,
    Query(filter): Query<TourFilter>,
) -> AppResult<impl IntoResponse> {
    let tours = state.tours.list(&filter).await?;
    let data: Vec<TourSummary> = tours.into_iter().map(TourSummary::from).collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/tours
pub async fn create_tour(
    State(state): State<AppState>,
    Json(doc): Json<TourDocument>,
) -> AppResult<impl IntoResponse> {
    let record = state.tours.create(&doc).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TourResponse::from(record),
        }),
    ))
}

/// POST /api/v1/tours/validate
///
/// Report every violation in a draft without saving it.
pub async fn validate_tour(
    State(state): State<AppState>,
    Json(doc): Json<TourDocument>,
) -> AppResult<impl IntoResponse> {
    let errors = state.tours.validate(&doc);
    Ok(Json(DataResponse {
        data: ValidationReport {
            valid: errors.is_empty(),
            errors,
        },
    }))
}

/// GET /api/v1/tours/{id}
pub async fn get_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let record = state.tours.get(tour_id).await?;
    Ok(Json(DataResponse {
        data: TourResponse::from(record),
    }))
}

/// PUT /api/v1/tours/{id}
///
/// Replace a tour with a new document.
pub async fn update_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
    Json(doc): Json<TourDocument>,
) -> AppResult<impl IntoResponse> {
    let record = state.tours.update(tour_id, &doc).await?;
    Ok(Json(DataResponse {
        data: TourResponse::from(record),
    }))
}

/// DELETE /api/v1/tours/{id}
pub async fn delete_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.tours.delete(tour_id).await?;
    state.analytics.forget(tour_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/tours/{id}/duplicate
pub async fn duplicate_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let record = state.tours.duplicate(tour_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TourResponse::from(record),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

/// GET /api/v1/tours/{id}/export
pub async fn export_tour(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let body = state.tours.export(tour_id).await?;
    Ok(json_attachment(format!("panotour-tour-{tour_id}.json"), body))
}

/// GET /api/v1/tours/export
///
/// Every tour in one export envelope.
pub async fn export_all_tours(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now();
    let body = state.tours.export_all(now).await?;
    Ok(json_attachment(
        format!("panotour-export-{}.json", now.format("%Y-%m-%d")),
        body,
    ))
}

/// POST /api/v1/tours/import?mode=batch|single
///
/// The body is an export envelope or a bare tour document. It is read as
/// raw text so malformed JSON is reported by the import pipeline.
pub async fn import_tours(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: String,
) -> AppResult<axum::response::Response> {
    match params.mode {
        ImportMode::Single => {
            let record = state.tours.import_single(&body).await?;
            Ok((
                StatusCode::CREATED,
                Json(DataResponse {
                    data: TourResponse::from(record),
                }),
            )
                .into_response())
        }
        ImportMode::Batch => {
            let report = state.tours.import_batch(&body).await?;
            let status = if report.created.is_empty() {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            let data = ImportReport {
                created: report.created.into_iter().map(TourResponse::from).collect(),
                errors: report.errors,
            };
            Ok((status, Json(DataResponse { data })).into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

/// GET /api/v1/tours/{id}/embed
///
/// The panorama engine configuration a viewer boots from.
pub async fn embed_config(
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let record = state.tours.get(tour_id).await?;
    let config = build_engine_config(&record.tour).map_err(|e| match e {
        ViewerError::EmptyTour => AppError::Core(CoreError::EmptyTour),
        other => AppError::InternalError(other.to_string()),
    })?;
    Ok(Json(DataResponse { data: config }))
}
