#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use panotour_api::config::ServerConfig;
use panotour_api::router::build_app_router;
use panotour_api::state::AppState;
use panotour_core::{MemoryTourRepo, TierLimits};
use panotour_events::AnalyticsRecorder;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults and the given limits.
pub fn test_config(limits: TierLimits) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 1,
        database_url: None,
        limits,
    }
}

/// Build the full application router on an in-memory repository, with the
/// analytics recorder running. Must be called inside a tokio runtime.
pub fn build_test_app() -> Router {
    build_test_app_with(TierLimits::lite())
}

pub fn build_test_app_with(limits: TierLimits) -> Router {
    let config = test_config(limits);
    let state = AppState::new(config.clone(), Arc::new(MemoryTourRepo::new()), None);

    tokio::spawn(AnalyticsRecorder::run(
        Arc::clone(&state.analytics),
        state.event_bus.subscribe(),
        CancellationToken::new(),
    ));

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, body: Option<String>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(text) => {
            builder = builder.header("content-type", "application/json");
            Body::from(text)
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body.to_string())).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body.to_string())).await
}

pub async fn post_text(app: Router, uri: &str, body: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(body.to_string())).await
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Two-scene tour: the foyer links to the studio.
pub fn tour_doc(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Open studio day",
        "settings": { "autorotate": { "enabled": true, "speed": 1.0 } },
        "scenes": [
            { "id": "foyer", "title": "Foyer", "image": { "url": "https://cdn.example/foyer.jpg" },
              "hotspots": [
                { "id": "to-studio", "type": "scene", "targetSceneId": "studio",
                  "position": { "yaw": 120, "pitch": -5 }, "title": "Studio" }
              ] },
            { "id": "studio", "title": "Studio", "image": { "url": "https://cdn.example/studio.jpg" } }
        ]
    })
}

/// Create a tour and return its id.
pub async fn create_tour(app: &Router, title: &str) -> i64 {
    let response = post_json(app.clone(), "/api/v1/tours", tour_doc(title)).await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
