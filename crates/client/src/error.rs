/// Errors from the service client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (connect, DNS, timeout, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote service returned a non-2xx status.
    #[error("Remote error ({status} {code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code from the remote envelope.
        code: String,
        /// Human-readable message from the remote envelope, or the raw body.
        message: String,
    },
}

impl ClientError {
    /// Whether repeating the same request could plausibly succeed.
    ///
    /// Client errors (4xx) are permanent: the payload itself was rejected.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Request(_) => true,
            ClientError::Api { status, .. } => !(400..500).contains(status),
        }
    }
}
