use axum::extract::State;
use axum::Json;
use blockmul_client::AggregatorClient;
use blockmul_core::protocol::{MultiplyTileRequest, MultiplyTileResponse, SubmitTileRequest};
use blockmul_server::error::{AppError, AppResult};
use blockmul_server::extract::AppJson;
use blockmul_server::response::DataResponse;

use crate::compute;
use crate::state::AppState;

/// POST /api/v1/multiply
///
/// Multiply one tile pair and submit the product to the aggregator before
/// responding. If the submission fails the product is dropped and the
/// caller gets `502 SUBMISSION_FAILED`; nothing is retried or cached here.
pub async fn multiply_tile(
    State(state): State<AppState>,
    AppJson(input): AppJson<MultiplyTileRequest>,
) -> AppResult<Json<DataResponse<MultiplyTileResponse>>> {
    input.validate()?;
    let coord = input.coord();
    let MultiplyTileRequest {
        job_id,
        sub_a,
        sub_b,
        aggregator_url,
        ..
    } = input;

    let computed = compute::multiply(sub_a, sub_b).await?;
    let shape = computed.product.shape();
    tracing::debug!(
        job_id = %job_id,
        i = coord.i,
        j = coord.j,
        k = coord.k,
        shape = %shape,
        compute_time_sec = computed.compute_time_sec,
        "Tile multiplied",
    );

    let aggregator = AggregatorClient::with_client(
        state.http.clone(),
        aggregator_url.as_deref().unwrap_or(&state.config.aggregator_url),
        state.config.submit_timeout,
    );
    let submission = SubmitTileRequest {
        i: coord.i,
        j: coord.j,
        k: coord.k,
        product: computed.product,
        duration_sec: computed.compute_time_sec,
    };

    if let Err(e) = aggregator.submit_tile(&job_id, &submission).await {
        tracing::error!(
            job_id = %job_id,
            i = coord.i,
            j = coord.j,
            k = coord.k,
            aggregator = aggregator.base_url(),
            error = %e,
            "Failed to submit tile to aggregator",
        );
        return Err(AppError::SubmissionFailed(format!(
            "Tile {coord} of job {job_id} could not be submitted: {e}"
        )));
    }

    Ok(Json(DataResponse {
        data: MultiplyTileResponse {
            message: format!("Tile {coord} computed and submitted"),
            shape,
            compute_time_sec: computed.compute_time_sec,
        },
    }))
}
