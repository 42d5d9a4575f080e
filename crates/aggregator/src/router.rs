//! Provides [`build_app_router`] so both `main.rs` and the integration
//! tests use the same middleware stack.

use axum::Router;
use blockmul_server::router::build_service_router;

use crate::config::AggregatorConfig;
use crate::routes;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "aggregator";

pub fn build_app_router(state: AppState, config: &AggregatorConfig) -> Router {
    build_service_router(
        SERVICE_NAME,
        routes::api_routes().with_state(state),
        &config.server,
    )
}
