use std::time::Instant;

use axum::extract::State;
use axum::Json;
use blockmul_core::protocol::{validate_job_id, SplitRequest, SplitResponse};
use blockmul_core::tiling::{decompose, resolve_block_size};
use blockmul_server::error::{AppError, AppResult};
use blockmul_server::extract::AppJson;
use blockmul_server::response::DataResponse;

use crate::dispatcher::DispatchError;
use crate::state::AppState;

/// POST /api/v1/split
///
/// Decompose `a x b`, register the job, and dispatch every tile. Returns
/// once all tiles have been attempted; it does not wait for the job to
/// become ready. Poll the aggregator's result endpoint for that.
pub async fn split(
    State(state): State<AppState>,
    AppJson(input): AppJson<SplitRequest>,
) -> AppResult<Json<DataResponse<SplitResponse>>> {
    let started = Instant::now();

    let job_id = match input.job_id {
        Some(job_id) => {
            validate_job_id(&job_id)?;
            job_id
        }
        None => uuid::Uuid::new_v4().to_string(),
    };

    let block_size = resolve_block_size(input.block_size, input.a.cols());
    let grid = *decompose(&input.a, &input.b, block_size)?.grid();
    let (shape_a, shape_b) = (input.a.shape(), input.b.shape());
    tracing::info!(
        job_id = %job_id,
        shape_a = %shape_a,
        shape_b = %shape_b,
        block_size,
        expected_tiles = grid.expected_tiles(),
        "Matrices decomposed",
    );

    let dispatcher = state.dispatcher(input.worker_url.as_deref(), input.aggregator_url.as_deref());
    let (a, b) = (input.a, input.b);
    let task_job_id = job_id.clone();
    // Detached from the request: a dropped connection must not abort tiles
    // that are already in flight.
    let dispatch = tokio::spawn(async move {
        let decomposition = decompose(&a, &b, block_size)?;
        dispatcher
            .dispatch(&task_job_id, &decomposition)
            .await
            .map_err(|e| match e {
                DispatchError::Registration(source) => AppError::RegistrationFailed(format!(
                    "Job {task_job_id} could not be registered: {source}"
                )),
            })
    });
    let report = dispatch
        .await
        .map_err(|e| AppError::InternalError(format!("Dispatch of job {job_id} failed: {e}")))??;

    Ok(Json(DataResponse {
        data: SplitResponse {
            job_id,
            block_size,
            row_tiles: grid.row_tiles(),
            col_tiles: grid.col_tiles(),
            depth_tiles: grid.depth_tiles(),
            expected_tiles: grid.expected_tiles(),
            dispatched: report.dispatched,
            failed: report.failed(),
            failed_tiles: report.failed_tiles,
            shape_a,
            shape_b,
            time_sec: started.elapsed().as_secs_f64(),
        },
    }))
}
