use blockmul_worker::config::WorkerConfig;
use blockmul_worker::router::build_app_router;
use blockmul_worker::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    blockmul_server::telemetry::init_tracing(
        "blockmul_worker=debug,blockmul_client=debug,blockmul_server=debug,tower_http=info",
    );

    let config = WorkerConfig::from_env();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        aggregator_url = %config.aggregator_url,
        submit_timeout_secs = config.submit_timeout.as_secs(),
        "Loaded worker configuration"
    );

    let app = build_app_router(AppState::new(config.clone()), &config);
    if let Err(e) = blockmul_server::serve(&config.server, app).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
    tracing::info!("Graceful shutdown complete");
}
