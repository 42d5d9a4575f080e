//! Registry-level accumulation properties: order independence, duplicate
//! tolerance under concurrency, and expiry.

use std::sync::Arc;

use assert_matches::assert_matches;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use blockmul_aggregator::background::job_expiry;
use blockmul_aggregator::registry::JobRegistry;
use blockmul_core::error::CoreError;
use blockmul_core::matrix::Matrix;
use blockmul_core::protocol::{FinalResult, JobState, RegisterJobRequest};
use blockmul_core::tiling::{decompose, TileTask};

const THRESHOLD: usize = 1_000_000;

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Matrix {
    let data = (0..rows * cols).map(|_| rng.random_range(-10.0..10.0)).collect();
    Matrix::from_vec(rows, cols, data).unwrap()
}

/// Decompose `a x b` and compute every tile product locally.
fn products(a: &Matrix, b: &Matrix, block_size: usize) -> (RegisterJobRequest, Vec<(TileTask, Matrix)>) {
    let decomposition = decompose(a, b, block_size).unwrap();
    let grid = *decomposition.grid();
    let tiles = decomposition
        .tasks()
        .map(|task| {
            let task = task.unwrap();
            let product = task.sub_a.matmul(&task.sub_b).unwrap();
            (task, product)
        })
        .collect();
    let request = RegisterJobRequest {
        job_id: String::new(),
        expected_tiles: grid.expected_tiles(),
        row_tiles: grid.row_tiles(),
        col_tiles: grid.col_tiles(),
    };
    (request, tiles)
}

fn stitched(result: FinalResult) -> Matrix {
    match result {
        FinalResult::Ready(ready) => ready.matrix.unwrap(),
        other => panic!("expected ready result, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: any arrival order stitches to A x B
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shuffled_submission_order_matches_direct_product() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let cases = [(7, 5, 9, 2), (10, 10, 10, 3), (4, 13, 6, 5), (12, 8, 3, 4), (3, 3, 3, 7)];
    let registry = JobRegistry::new();

    for (case, &(m, n, p, block)) in cases.iter().enumerate() {
        let a = random_matrix(&mut rng, m, n);
        let b = random_matrix(&mut rng, n, p);
        let expected = a.matmul(&b).unwrap();
        let (mut request, tiles) = products(&a, &b, block);

        for round in 0..3 {
            let mut order: Vec<&(TileTask, Matrix)> = tiles.iter().collect();
            order.shuffle(&mut rng);
            request.job_id = format!("case-{case}-round-{round}");
            registry.register(&request).await.unwrap();

            for (task, product) in order {
                registry
                    .submit(&request.job_id, task.coord, product.clone(), 0.01)
                    .await
                    .unwrap();
            }

            let result = registry.final_result(&request.job_id, THRESHOLD).await.unwrap();
            assert!(
                stitched(result).approx_eq(&expected, 1e-3, 1e-4),
                "{m}x{n} * {n}x{p} with block {block} diverged"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Test: concurrent submissions with duplicates count each tile once
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_submissions_are_counted_once() {
    let mut rng = StdRng::seed_from_u64(42);
    let a = random_matrix(&mut rng, 9, 9);
    let b = random_matrix(&mut rng, 9, 9);
    let expected = a.matmul(&b).unwrap();
    let (mut request, tiles) = products(&a, &b, 2);
    request.job_id = "concurrent".into();

    let registry = Arc::new(JobRegistry::new());
    registry.register(&request).await.unwrap();

    // Every tile is sent three times from independent tasks.
    let mut handles = Vec::new();
    for _ in 0..3 {
        let mut order = tiles.clone();
        order.shuffle(&mut rng);
        for (task, product) in order {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .submit("concurrent", task.coord, product, 0.01)
                    .await
                    .unwrap()
            }));
        }
    }

    let mut accepted = 0;
    let mut became_ready = 0;
    for handle in handles {
        let outcome = handle.await.unwrap();
        if !outcome.is_duplicate() {
            accepted += 1;
        }
        if matches!(
            outcome,
            blockmul_aggregator::job::SubmitOutcome::Accepted { became_ready: true, .. }
        ) {
            became_ready += 1;
        }
    }

    assert_eq!(accepted, request.expected_tiles);
    assert_eq!(became_ready, 1);

    let progress = registry.progress("concurrent").await.unwrap();
    assert_eq!(progress.received, request.expected_tiles);
    assert_eq!(progress.state, JobState::Ready);

    let result = registry.final_result("concurrent", THRESHOLD).await.unwrap();
    assert!(stitched(result).approx_eq(&expected, 1e-3, 1e-4));
}

// ---------------------------------------------------------------------------
// Test: a missing tile keeps the job not-ready forever
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lost_tile_never_becomes_ready() {
    let a = Matrix::identity(4);
    let (mut request, tiles) = products(&a, &a, 2);
    request.job_id = "lost".into();
    let registry = JobRegistry::new();
    registry.register(&request).await.unwrap();

    for (task, product) in tiles.iter().skip(1) {
        registry.submit("lost", task.coord, product.clone(), 0.01).await.unwrap();
    }

    for _ in 0..3 {
        let result = registry.final_result("lost", THRESHOLD).await.unwrap();
        assert_eq!(result, FinalResult::NotReady { received: 7, expected: 8 });
    }
}

// ---------------------------------------------------------------------------
// Test: unknown jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_errors_name_the_job() {
    let registry = JobRegistry::new();

    let submit = registry
        .submit("missing", blockmul_core::types::TileCoord::new(0, 0, 0), Matrix::identity(1), 0.0)
        .await;
    assert_matches!(submit, Err(CoreError::UnknownJob(id)) if id == "missing");

    let result = registry.final_result("missing", THRESHOLD).await;
    assert_matches!(result, Err(CoreError::UnknownJob(_)));
}

// ---------------------------------------------------------------------------
// Test: expiry removes only old jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_removes_jobs_past_ttl() {
    let registry = JobRegistry::new();
    let request = RegisterJobRequest {
        job_id: "old".into(),
        expected_tiles: 1,
        row_tiles: 1,
        col_tiles: 1,
    };
    registry.register(&request).await.unwrap();

    // A generous TTL keeps the job.
    assert_eq!(job_expiry::sweep(&registry, chrono::Duration::hours(1)).await, 0);
    assert_eq!(registry.job_count().await, 1);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(job_expiry::sweep(&registry, chrono::Duration::milliseconds(5)).await, 1);
    assert_eq!(registry.job_count().await, 0);

    let result = registry.final_result("old", THRESHOLD).await;
    assert_matches!(result, Err(CoreError::UnknownJob(_)));
}

#[tokio::test]
async fn sweeper_stops_on_cancel() {
    let registry = Arc::new(JobRegistry::new());
    let cancel = tokio_util::sync::CancellationToken::new();
    let handle = tokio::spawn(job_expiry::run(
        Arc::clone(&registry),
        std::time::Duration::from_secs(60),
        std::time::Duration::from_millis(10),
        cancel.clone(),
    ));

    cancel.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("sweeper did not stop")
        .unwrap();
}
