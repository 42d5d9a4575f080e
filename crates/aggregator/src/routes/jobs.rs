use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /                    -> list_jobs
/// POST   /                    -> register_job
/// POST   /{job_id}/tiles      -> submit_tile
/// GET    /{job_id}/result     -> get_result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::register_job))
        .route("/{job_id}/tiles", post(jobs::submit_tile))
        .route("/{job_id}/result", get(jobs::get_result))
}
