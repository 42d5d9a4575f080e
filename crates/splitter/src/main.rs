use blockmul_splitter::config::SplitterConfig;
use blockmul_splitter::router::build_app_router;
use blockmul_splitter::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    blockmul_server::telemetry::init_tracing(
        "blockmul_splitter=debug,blockmul_client=debug,blockmul_server=debug,tower_http=info",
    );

    let config = SplitterConfig::from_env();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        worker_url = %config.worker_url,
        aggregator_url = %config.aggregator_url,
        pool_size = config.dispatch.pool_size,
        task_timeout_secs = config.dispatch.task_timeout.as_secs(),
        max_retries = config.dispatch.max_retries,
        "Loaded splitter configuration"
    );

    let app = build_app_router(AppState::new(config.clone()), &config);
    if let Err(e) = blockmul_server::serve(&config.server, app).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
    tracing::info!("Graceful shutdown complete");
}
