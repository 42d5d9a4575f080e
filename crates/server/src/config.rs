use std::fmt::Display;
use std::str::FromStr;

/// Default request timeout. Large tiles and large final results take a
/// while to serialize, so this is generous.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default maximum request body size (1 GiB).
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024 * 1024;

/// HTTP server configuration shared by every service, loaded from
/// environment variables.
///
/// All fields have defaults suitable for local development. In
/// production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default depends on the service).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `300`).
    pub request_timeout_secs: u64,
    /// Maximum accepted request body in bytes (default: 1 GiB).
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default          |
    /// |------------------------|------------------|
    /// | `HOST`                 | `0.0.0.0`        |
    /// | `PORT`                 | `default_port`   |
    /// | `REQUEST_TIMEOUT_SECS` | `300`            |
    /// | `MAX_BODY_BYTES`       | `1073741824`     |
    pub fn from_env(default_port: u16) -> Self {
        Self {
            host: env_string("HOST", "0.0.0.0"),
            port: env_parse("PORT", default_port),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: env_parse("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
    }

    /// Configuration for tests: loopback, ephemeral port, short timeout.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Read a string variable, falling back to `default`.
pub fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse a variable, falling back to `default` when unset.
///
/// Panics at startup if the variable is set but invalid -- misconfiguration
/// should fail fast.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    env_optional(key).unwrap_or(default)
}

/// Read and parse an optional variable. Unset or empty yields `None`.
///
/// Panics at startup if the variable is set but invalid.
pub fn env_optional<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = std::env::var(key).ok().filter(|v| !v.trim().is_empty())?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => panic!("{key} must be a valid value, got '{raw}': {e}"),
    }
}
