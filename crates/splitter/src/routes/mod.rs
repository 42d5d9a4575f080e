use axum::routing::post;
use axum::Router;

use crate::handlers::split;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// POST /split           -> split
/// ```
///
/// `/split` holds the request open until every tile has been attempted, so
/// it is served outside the request timeout. Per-task timeouts bound it.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/split", post(split::split))
}
