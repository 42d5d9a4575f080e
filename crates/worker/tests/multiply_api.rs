//! Worker endpoint tests against a real in-process aggregator.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use blockmul_core::protocol::{FinalResult, RegisterJobRequest};
use common::{build_test_app, closed_url, post_json, spawn_aggregator};

async fn register(aggregator: &common::TestAggregator, job_id: &str, expected: usize) {
    aggregator
        .state
        .registry
        .register(&RegisterJobRequest {
            job_id: job_id.into(),
            expected_tiles: expected,
            row_tiles: 1,
            col_tiles: 1,
        })
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Test: product is computed and lands in the aggregator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn multiply_submits_product_to_aggregator() {
    let aggregator = spawn_aggregator().await;
    register(&aggregator, "job-1", 1).await;
    let app = build_test_app(&aggregator.url);

    let (status, json) = post_json(
        &app,
        "/api/v1/multiply",
        json!({
            "job_id": "job-1", "i": 0, "j": 0, "k": 0,
            "sub_a": [[1.0, 2.0], [3.0, 4.0]],
            "sub_b": [[0.0, 1.0], [1.0, 0.0]]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["shape"], json!([2, 2]));
    assert!(json["data"]["compute_time_sec"].as_f64().unwrap() >= 0.0);

    let result = aggregator.state.registry.final_result("job-1", 100).await.unwrap();
    match result {
        FinalResult::Ready(ready) => {
            assert_eq!(ready.matrix.unwrap().to_rows(), vec![vec![2.0, 1.0], vec![4.0, 3.0]]);
            assert!(ready.worker_time_stats.is_some());
        }
        other => panic!("expected ready, got {other:?}"),
    }
}

#[tokio::test]
async fn request_aggregator_url_overrides_default() {
    let aggregator = spawn_aggregator().await;
    register(&aggregator, "override", 1).await;
    let app = build_test_app(&closed_url().await);

    let (status, _) = post_json(
        &app,
        "/api/v1/multiply",
        json!({
            "job_id": "override", "i": 0, "j": 0, "k": 0,
            "sub_a": [[2.0]], "sub_b": [[3.0]],
            "aggregator_url": aggregator.url
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let progress = aggregator.state.registry.progress("override").await.unwrap();
    assert_eq!(progress.received, 1);
}

// ---------------------------------------------------------------------------
// Test: shape mismatch is a 400 and nothing is submitted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mismatched_shapes_are_400() {
    let aggregator = spawn_aggregator().await;
    register(&aggregator, "bad", 1).await;
    let app = build_test_app(&aggregator.url);

    let (status, json) = post_json(
        &app,
        "/api/v1/multiply",
        json!({
            "job_id": "bad", "i": 0, "j": 0, "k": 0,
            "sub_a": [[1.0, 2.0, 3.0]],
            "sub_b": [[1.0], [2.0]]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "DIMENSION_MISMATCH");
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("1x3") && message.contains("2x1"), "{message}");
    let progress = aggregator.state.registry.progress("bad").await.unwrap();
    assert_eq!(progress.received, 0);
}

// ---------------------------------------------------------------------------
// Test: submission failures surface as 502
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_aggregator_is_502() {
    let app = build_test_app(&closed_url().await);

    let (status, json) = post_json(
        &app,
        "/api/v1/multiply",
        json!({ "job_id": "job", "i": 0, "j": 0, "k": 0, "sub_a": [[1.0]], "sub_b": [[1.0]] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "SUBMISSION_FAILED");
}

#[tokio::test]
async fn unregistered_job_is_502_with_remote_reason() {
    let aggregator = spawn_aggregator().await;
    let app = build_test_app(&aggregator.url);

    let (status, json) = post_json(
        &app,
        "/api/v1/multiply",
        json!({ "job_id": "never", "i": 0, "j": 0, "k": 0, "sub_a": [[1.0]], "sub_b": [[1.0]] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "SUBMISSION_FAILED");
    assert!(json["error"].as_str().unwrap().contains("UNKNOWN_JOB"));
}

#[tokio::test]
async fn invalid_job_id_is_rejected() {
    let app = build_test_app(&closed_url().await);

    let (status, json) = post_json(
        &app,
        "/api/v1/multiply",
        json!({ "job_id": "a/b", "i": 0, "j": 0, "k": 0, "sub_a": [[1.0]], "sub_b": [[1.0]] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
