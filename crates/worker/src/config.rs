use std::time::Duration;

use blockmul_server::config::{env_parse, env_string, ServerConfig};

/// Default listen port of the worker.
pub const DEFAULT_PORT: u16 = 8001;

const DEFAULT_AGGREGATOR_URL: &str = "http://aggregator:8002";
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 60;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub server: ServerConfig,
    /// Aggregator used when a request does not name one.
    pub aggregator_url: String,
    /// Timeout for submitting a product to the aggregator.
    pub submit_timeout: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                  |
    /// |-----------------------|--------------------------|
    /// | `PORT`                | `8001`                   |
    /// | `AGGREGATOR_URL`      | `http://aggregator:8002` |
    /// | `SUBMIT_TIMEOUT_SECS` | `60`                     |
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(DEFAULT_PORT),
            aggregator_url: env_string("AGGREGATOR_URL", DEFAULT_AGGREGATOR_URL),
            submit_timeout: Duration::from_secs(env_parse(
                "SUBMIT_TIMEOUT_SECS",
                DEFAULT_SUBMIT_TIMEOUT_SECS,
            )),
        }
    }

    /// Test configuration pointing at `aggregator_url`.
    pub fn for_tests(aggregator_url: &str) -> Self {
        Self {
            server: ServerConfig::for_tests(),
            aggregator_url: aggregator_url.to_string(),
            submit_timeout: Duration::from_secs(5),
        }
    }
}
