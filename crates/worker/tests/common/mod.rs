#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use blockmul_aggregator::config::AggregatorConfig;
use blockmul_worker::config::WorkerConfig;
use blockmul_worker::router::build_app_router;
use blockmul_worker::state::AppState;

/// Worker router with the production middleware stack.
pub fn build_test_app(aggregator_url: &str) -> Router {
    let config = WorkerConfig::for_tests(aggregator_url);
    build_app_router(AppState::new(config.clone()), &config)
}

/// A real aggregator served on an ephemeral loopback port.
pub struct TestAggregator {
    pub url: String,
    pub state: blockmul_aggregator::state::AppState,
}

pub async fn spawn_aggregator() -> TestAggregator {
    let config = AggregatorConfig::for_tests();
    let state = blockmul_aggregator::state::AppState::new(config.clone());
    let app = blockmul_aggregator::router::build_app_router(state.clone(), &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestAggregator {
        url: format!("http://{addr}"),
        state,
    }
}

/// A loopback URL nothing is listening on.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}
