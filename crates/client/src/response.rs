use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ClientError;

/// Standard `{ "data": T }` success envelope.
#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Standard `{ "error": ..., "code": ... }` failure envelope.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
    code: String,
}

/// Check the status and decode the `data` payload of a response.
pub(crate) async fn parse_data<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    let envelope: DataEnvelope<T> = response.json().await?;
    Ok(envelope.data)
}

/// Return the response unchanged on 2xx, otherwise a [`ClientError::Api`]
/// carrying the remote's error envelope (or raw body when it has none).
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (envelope.code, envelope.error),
        Err(_) => ("UNKNOWN".to_string(), body),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

/// Strip a trailing slash so paths can be appended with `format!`.
pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
