use axum::Router;
use blockmul_server::router::build_service_router;

use crate::config::WorkerConfig;
use crate::routes;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "worker";

/// Build the worker router with the shared middleware stack.
pub fn build_app_router(state: AppState, config: &WorkerConfig) -> Router {
    build_service_router(
        SERVICE_NAME,
        routes::api_routes().with_state(state),
        &config.server,
    )
}
