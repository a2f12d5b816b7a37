//! Tests for the `AppError` to HTTP response mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use panotour_api::error::AppError;
use panotour_core::error::CoreError;
use panotour_core::{ValidationError, ValidationErrors};
use serde_json::Value;

async fn error_parts(error: AppError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn not_found_maps_to_404() {
    let (status, json) = error_parts(AppError::Core(CoreError::not_found("Tour", 7))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Tour with id 7 not found");
}

#[tokio::test]
async fn validation_errors_are_listed_in_details() {
    let errors: ValidationErrors = vec![
        ValidationError::new("tour", "Title is required"),
        ValidationError::new("scene 1 (Lobby)", "Panorama image is required (media id or URL)"),
    ]
    .into();
    let (status, json) = error_parts(AppError::Core(CoreError::Validation(errors))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Tour has 2 validation errors");
    assert_eq!(json["details"][1]["path"], "scene 1 (Lobby)");
}

#[tokio::test]
async fn limit_and_malformed_documents() {
    let (status, json) =
        error_parts(AppError::Core(CoreError::LimitReached("10 tours".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "LIMIT_REACHED");

    let (status, json) =
        error_parts(AppError::Core(CoreError::MalformedDocument("Invalid JSON".into()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MALFORMED_DOCUMENT");
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let (status, json) =
        error_parts(AppError::Core(CoreError::Internal("connection reset".into()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");

    let (status, _) = error_parts(AppError::Database(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = error_parts(AppError::Database(sqlx::Error::PoolTimedOut)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn bad_request_keeps_its_message() {
    let (status, json) = error_parts(AppError::BadRequest("Scene 'x' does not exist".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Scene 'x' does not exist");
}
