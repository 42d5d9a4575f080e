use std::time::Duration;

use tokio_util::sync::CancellationToken;

use blockmul_aggregator::background::job_expiry;
use blockmul_aggregator::config::AggregatorConfig;
use blockmul_aggregator::router::build_app_router;
use blockmul_aggregator::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    blockmul_server::telemetry::init_tracing(
        "blockmul_aggregator=debug,blockmul_server=debug,tower_http=info",
    );

    // --- Configuration ---
    let config = AggregatorConfig::from_env();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        summary_threshold = config.summary_threshold,
        job_ttl_secs = config.job_ttl.map(|ttl| ttl.as_secs()),
        "Loaded aggregator configuration"
    );

    // --- App state ---
    let state = AppState::new(config.clone());

    // --- Job expiry (opt-in) ---
    let expiry_cancel = CancellationToken::new();
    let expiry_handle = config.job_ttl.map(|ttl| {
        tokio::spawn(job_expiry::run(
            state.registry.clone(),
            ttl,
            config.sweep_interval,
            expiry_cancel.clone(),
        ))
    });

    // --- Start server ---
    let app = build_app_router(state.clone(), &config);
    let served = blockmul_server::serve(&config.server, app).await;

    // --- Post-shutdown cleanup ---
    expiry_cancel.cancel();
    if let Some(handle) = expiry_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Job expiry sweeper stopped");
    }

    let jobs = state.registry.job_count().await;
    match served {
        Ok(()) => tracing::info!(jobs, "Graceful shutdown complete"),
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            std::process::exit(1);
        }
    }
}
