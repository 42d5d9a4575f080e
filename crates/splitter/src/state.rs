use std::sync::Arc;

use blockmul_client::{AggregatorClient, WorkerClient};

use crate::config::SplitterConfig;
use crate::dispatcher::{Dispatcher, HttpTileTransport};

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SplitterConfig>,
    /// Shared connection pool for aggregator and worker calls.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: SplitterConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }

    /// Build a dispatcher, honouring per-request endpoint overrides.
    ///
    /// An overridden aggregator is also forwarded to the worker so that
    /// registration and submissions reach the same instance.
    pub fn dispatcher(&self, worker_url: Option<&str>, aggregator_url: Option<&str>) -> Dispatcher {
        let registrar = AggregatorClient::with_client(
            self.http.clone(),
            aggregator_url.unwrap_or(&self.config.aggregator_url),
            self.config.register_timeout,
        );
        let worker = WorkerClient::with_client(
            self.http.clone(),
            worker_url.unwrap_or(&self.config.worker_url),
            self.config.dispatch.task_timeout,
        );
        let transport = HttpTileTransport::new(worker, aggregator_url.map(str::to_string));

        Dispatcher::new(
            Arc::new(registrar),
            Arc::new(transport),
            self.config.dispatch.clone(),
        )
    }
}
