use axum::Router;
use blockmul_server::router::build_service_router_with_long_running;

use crate::config::SplitterConfig;
use crate::routes;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "splitter";

/// Build the splitter router with the shared middleware stack.
pub fn build_app_router(state: AppState, config: &SplitterConfig) -> Router {
    build_service_router_with_long_running(
        SERVICE_NAME,
        Router::new(),
        routes::api_routes().with_state(state),
        &config.server,
    )
}
