//! Shared application router builder.
//!
//! Every service wraps its `/api/v1` routes with [`build_service_router`] so
//! the production binaries and the integration tests use the exact same
//! middleware stack.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::routes;

/// Build the full [`Router`] for `service` with all middleware layers.
///
/// `api` must already have its state attached. See
/// [`build_service_router_with_long_running`] for the layer order.
pub fn build_service_router(service: &'static str, api: Router, config: &ServerConfig) -> Router {
    build_service_router_with_long_running(service, api, Router::new(), config)
}

/// Like [`build_service_router`], with extra `long_running` routes that are
/// exempt from the request timeout. Those handlers must bound their own
/// running time.
///
/// The middleware stack is applied bottom-up:
///
/// 1. Body size limit
/// 2. Set request ID on incoming requests
/// 3. Structured request/response tracing
/// 4. Propagate request ID to response
/// 5. Timeout responses rewritten into the error envelope
/// 6. Panic recovery (catch panics, return 500)
/// 7. Request timeout (health and `api` routes only)
pub fn build_service_router_with_long_running(
    service: &'static str,
    api: Router,
    long_running: Router,
    config: &ServerConfig,
) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.request_timeout_secs),
    );

    Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router(service).layer(timeout.clone()))
        // API v1 routes. Routes merged after the layer are not covered by it.
        .nest("/api/v1", api.layer(timeout).merge(long_running))
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // The timeout layer answers with an empty 408.
        .layer(middleware::map_response(timeout_envelope))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // Matrices arrive as JSON; lift axum's 2 MB default.
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
}

async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return AppError::RequestTimeout.into_response();
    }
    response
}
