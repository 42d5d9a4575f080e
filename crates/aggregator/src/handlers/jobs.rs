//! Handlers for the `/jobs` resource.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use blockmul_core::protocol::{
    FinalResult, JobProgress, RegisterJobRequest, RegisterJobResponse, SubmitTileRequest,
    SubmitTileResponse,
};
use blockmul_core::types::JobId;
use blockmul_server::error::AppResult;
use blockmul_server::extract::AppJson;
use blockmul_server::response::DataResponse;

use crate::job::SubmitOutcome;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Register a job before any of its tiles are dispatched. Returns 201 for a
/// new job and 200 with the existing configuration for a known id.
pub async fn register_job(
    State(state): State<AppState>,
    AppJson(input): AppJson<RegisterJobRequest>,
) -> AppResult<impl IntoResponse> {
    let registration = state.registry.register(&input).await?;
    let config = &registration.config;

    let (status, message) = if registration.created {
        tracing::info!(
            job_id = %config.job_id,
            expected = config.expected_tiles,
            row_tiles = config.row_tiles,
            col_tiles = config.col_tiles,
            depth_tiles = config.depth_tiles,
            "Job registered",
        );
        (StatusCode::CREATED, format!("Job {} registered", config.job_id))
    } else {
        tracing::info!(job_id = %config.job_id, "Job already registered, keeping existing configuration");
        (StatusCode::OK, format!("Job {} already registered", config.job_id))
    };

    Ok((
        status,
        Json(DataResponse {
            data: RegisterJobResponse {
                message,
                expected: config.expected_tiles,
                created: registration.created,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
) -> Json<DataResponse<BTreeMap<JobId, JobProgress>>> {
    Json(DataResponse {
        data: state.registry.list().await,
    })
}

// ---------------------------------------------------------------------------
// Submit tile
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/{job_id}/tiles
///
/// Accumulate one partial product. A repeated `(i, j, k)` succeeds without
/// effect and is flagged with `duplicate: true`.
pub async fn submit_tile(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
    AppJson(input): AppJson<SubmitTileRequest>,
) -> AppResult<Json<DataResponse<SubmitTileResponse>>> {
    input.validate()?;
    let coord = input.coord();

    let outcome = state
        .registry
        .submit(&job_id, coord, input.product, input.duration_sec)
        .await?;

    let message = match outcome {
        SubmitOutcome::Duplicate { .. } => {
            tracing::debug!(job_id = %job_id, i = coord.i, j = coord.j, k = coord.k, "Duplicate tile ignored");
            format!("Tile {coord} already received")
        }
        SubmitOutcome::Accepted {
            received,
            expected,
            became_ready,
        } => {
            tracing::debug!(
                job_id = %job_id,
                i = coord.i,
                j = coord.j,
                k = coord.k,
                received,
                expected,
                duration_sec = input.duration_sec,
                "Tile accumulated",
            );
            if became_ready {
                tracing::info!(job_id = %job_id, expected, "All tiles received, job ready");
            }
            format!("Tile {coord} accumulated")
        }
    };

    Ok(Json(DataResponse {
        data: SubmitTileResponse {
            message,
            duplicate: outcome.is_duplicate(),
            received: outcome.received(),
            expected: outcome.expected(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Final result
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{job_id}/result
///
/// Not-ready is a normal `200` response carrying progress.
pub async fn get_result(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<Json<DataResponse<FinalResult>>> {
    let result = state
        .registry
        .final_result(&job_id, state.config.summary_threshold)
        .await?;
    Ok(Json(DataResponse { data: result }))
}
