#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use blockmul_aggregator::config::AggregatorConfig;
use blockmul_aggregator::router::build_app_router;
use blockmul_aggregator::state::AppState;

/// Build the full application router with the production middleware stack.
pub fn build_test_app(config: AggregatorConfig) -> Router {
    let state = AppState::new(config.clone());
    build_app_router(state, &config)
}

/// Router with test defaults.
pub fn test_app() -> Router {
    build_test_app(AggregatorConfig::for_tests())
}

/// Collect a response body into JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a JSON POST and return status plus parsed body.
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Send a GET and return status plus parsed body.
pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// Register `job_id` with the given grid.
pub async fn register(app: &Router, job_id: &str, row: usize, col: usize, depth: usize) -> Value {
    let (status, json) = post_json(
        app,
        "/api/v1/jobs",
        serde_json::json!({
            "job_id": job_id,
            "expected_tiles": row * col * depth,
            "row_tiles": row,
            "col_tiles": col,
        }),
    )
    .await;
    assert!(status.is_success(), "register failed: {status} {json}");
    json
}
