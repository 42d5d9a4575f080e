use std::time::Duration;

use blockmul_server::config::{env_parse, env_string, ServerConfig};

/// Default listen port of the splitter.
pub const DEFAULT_PORT: u16 = 8000;

const DEFAULT_WORKER_URL: &str = "http://worker:8001";
const DEFAULT_AGGREGATOR_URL: &str = "http://aggregator:8002";
const DEFAULT_POOL_SIZE: usize = 16;
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 120;
const DEFAULT_REGISTER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;

/// Tuning of the dispatch pool.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of tile tasks in flight at once.
    pub pool_size: usize,
    /// Timeout of a single send attempt.
    pub task_timeout: Duration,
    /// Extra attempts after the first failure. `0` disables retry.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further attempt.
    pub retry_backoff: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
            max_retries: 0,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

/// Splitter configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub server: ServerConfig,
    pub worker_url: String,
    pub aggregator_url: String,
    pub register_timeout: Duration,
    pub dispatch: DispatchConfig,
}

impl SplitterConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                  |
    /// |-----------------------------|--------------------------|
    /// | `PORT`                      | `8000`                   |
    /// | `WORKER_URL`                | `http://worker:8001`     |
    /// | `AGGREGATOR_URL`            | `http://aggregator:8002` |
    /// | `DISPATCH_POOL_SIZE`        | `16`                     |
    /// | `DISPATCH_TIMEOUT_SECS`     | `120`                    |
    /// | `REGISTER_TIMEOUT_SECS`     | `10`                     |
    /// | `DISPATCH_MAX_RETRIES`      | `0`                      |
    /// | `DISPATCH_RETRY_BACKOFF_MS` | `200`                    |
    pub fn from_env() -> Self {
        let pool_size: usize = env_parse("DISPATCH_POOL_SIZE", DEFAULT_POOL_SIZE);
        Self {
            server: ServerConfig::from_env(DEFAULT_PORT),
            worker_url: env_string("WORKER_URL", DEFAULT_WORKER_URL),
            aggregator_url: env_string("AGGREGATOR_URL", DEFAULT_AGGREGATOR_URL),
            register_timeout: Duration::from_secs(env_parse(
                "REGISTER_TIMEOUT_SECS",
                DEFAULT_REGISTER_TIMEOUT_SECS,
            )),
            dispatch: DispatchConfig {
                pool_size: pool_size.max(1),
                task_timeout: Duration::from_secs(env_parse(
                    "DISPATCH_TIMEOUT_SECS",
                    DEFAULT_TASK_TIMEOUT_SECS,
                )),
                max_retries: env_parse("DISPATCH_MAX_RETRIES", 0),
                retry_backoff: Duration::from_millis(env_parse(
                    "DISPATCH_RETRY_BACKOFF_MS",
                    DEFAULT_RETRY_BACKOFF_MS,
                )),
            },
        }
    }

    /// Test configuration pointing at the given services.
    pub fn for_tests(worker_url: &str, aggregator_url: &str) -> Self {
        Self {
            server: ServerConfig::for_tests(),
            worker_url: worker_url.to_string(),
            aggregator_url: aggregator_url.to_string(),
            register_timeout: Duration::from_secs(5),
            dispatch: DispatchConfig {
                task_timeout: Duration::from_secs(10),
                ..DispatchConfig::default()
            },
        }
    }
}
