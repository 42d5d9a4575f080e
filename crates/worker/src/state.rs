use std::sync::Arc;

use crate::config::WorkerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WorkerConfig>,
    /// Shared connection pool for aggregator submissions.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }
}
