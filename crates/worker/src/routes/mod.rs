use axum::routing::post;
use axum::Router;

use crate::handlers::multiply;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// POST /multiply        -> multiply_tile
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/multiply", post(multiply::multiply_tile))
}
