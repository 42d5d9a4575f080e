#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use blockmul_aggregator::config::AggregatorConfig;
use blockmul_client::AggregatorClient;
use blockmul_core::protocol::{FinalResult, ReadyResult};
use blockmul_splitter::config::SplitterConfig;
use blockmul_splitter::router::build_app_router;
use blockmul_splitter::state::AppState;
use blockmul_worker::config::WorkerConfig;

/// Serve `app` on an ephemeral loopback port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A loopback URL nothing is listening on.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// A worker stand-in that accepts connections and never answers.
///
/// Returns its URL and a counter of accepted connections.
pub async fn silent_worker() -> (String, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });
    (format!("http://{addr}"), accepted)
}

/// Aggregator and worker running in-process over real HTTP.
pub struct Cluster {
    pub aggregator_url: String,
    pub worker_url: String,
    pub aggregator: blockmul_aggregator::state::AppState,
}

pub async fn spawn_cluster() -> Cluster {
    let aggregator_config = AggregatorConfig::for_tests();
    let aggregator = blockmul_aggregator::state::AppState::new(aggregator_config.clone());
    let aggregator_url = serve(blockmul_aggregator::router::build_app_router(
        aggregator.clone(),
        &aggregator_config,
    ))
    .await;

    let worker_config = WorkerConfig::for_tests(&aggregator_url);
    let worker_url = serve(blockmul_worker::router::build_app_router(
        blockmul_worker::state::AppState::new(worker_config.clone()),
        &worker_config,
    ))
    .await;

    Cluster {
        aggregator_url,
        worker_url,
        aggregator,
    }
}

/// Splitter router wired to the given services.
pub fn build_test_app(config: SplitterConfig) -> Router {
    build_app_router(AppState::new(config.clone()), &config)
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

/// Poll the aggregator until `job_id` is ready.
pub async fn wait_until_ready(aggregator_url: &str, job_id: &str) -> ReadyResult {
    let client = AggregatorClient::new(aggregator_url, Duration::from_secs(5));
    let jobs = client.list_jobs().await.unwrap();
    assert!(jobs.contains_key(job_id), "job {job_id} was never registered");
    for _ in 0..100 {
        match client.final_result(job_id).await.unwrap() {
            FinalResult::Ready(ready) => return ready,
            FinalResult::NotReady { .. } => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    panic!("job {job_id} never became ready");
}
