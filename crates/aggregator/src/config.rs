use std::time::Duration;

use blockmul_server::config::{env_optional, env_parse, ServerConfig};

/// Default listen port of the aggregator.
pub const DEFAULT_PORT: u16 = 8002;

/// Results with more elements than this are returned as a summary.
const DEFAULT_SUMMARY_THRESHOLD: usize = 1_000_000;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Aggregator configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub server: ServerConfig,
    /// Element count above which a ready result carries a summary instead
    /// of the full matrix.
    pub summary_threshold: usize,
    /// Jobs older than this are removed by the expiry sweeper. `None` keeps
    /// jobs for the lifetime of the process.
    pub job_ttl: Option<Duration>,
    /// How often the expiry sweeper runs when `job_ttl` is set.
    pub sweep_interval: Duration,
}

impl AggregatorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default     |
    /// |------------------------------|-------------|
    /// | `PORT`                       | `8002`      |
    /// | `SUMMARY_THRESHOLD_ELEMENTS` | `1000000`   |
    /// | `JOB_TTL_SECS`               | unset       |
    /// | `JOB_SWEEP_INTERVAL_SECS`    | `60`        |
    ///
    /// See [`ServerConfig::from_env`] for the shared variables.
    pub fn from_env() -> Self {
        let sweep_secs: u64 = env_parse("JOB_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);
        Self {
            server: ServerConfig::from_env(DEFAULT_PORT),
            summary_threshold: env_parse("SUMMARY_THRESHOLD_ELEMENTS", DEFAULT_SUMMARY_THRESHOLD),
            job_ttl: env_optional::<u64>("JOB_TTL_SECS").map(Duration::from_secs),
            sweep_interval: Duration::from_secs(sweep_secs.max(1)),
        }
    }

    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig::for_tests(),
            summary_threshold: DEFAULT_SUMMARY_THRESHOLD,
            job_ttl: None,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}
