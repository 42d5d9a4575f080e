use std::sync::Arc;

use crate::config::AggregatorConfig;
use crate::registry::JobRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// In-memory registry of every job this process has accepted.
    pub registry: Arc<JobRegistry>,
    pub config: Arc<AggregatorConfig>,
}

impl AppState {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            config: Arc::new(config),
        }
    }
}
