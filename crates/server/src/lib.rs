//! HTTP plumbing shared by the splitter, worker, and aggregator services:
//! configuration, the middleware stack, error mapping, the response
//! envelope, health checks, tracing setup, and graceful shutdown.

pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod router;
pub mod routes;
pub mod shutdown;
pub mod telemetry;

use std::net::{IpAddr, SocketAddr};

use axum::Router;

use crate::config::ServerConfig;

/// Bind to the configured address and serve `app` until SIGINT/SIGTERM.
pub async fn serve(config: &ServerConfig, app: Router) -> std::io::Result<()> {
    let host: IpAddr = config.host.parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid HOST address '{}': {e}", config.host),
        )
    })?;
    let addr = SocketAddr::new(host, config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
}
