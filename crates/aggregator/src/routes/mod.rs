pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /jobs                            register, list
/// /jobs/{job_id}/tiles             submit a partial product
/// /jobs/{job_id}/result            progress or stitched result
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/jobs", jobs::router())
}
