use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blockmul_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds the transport-level
/// failures of talking to another service. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `blockmul_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The aggregator could not be reached or refused the job registration.
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    /// The computed tile could not be delivered to the aggregator.
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    /// Dispatch could not proceed.
    #[error("Dispatch failed: {0}")]
    DispatchFailed(String),

    /// The request did not complete within the server's request timeout.
    #[error("Request timed out")]
    RequestTimeout,

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                AppError::Core(CoreError::Validation(e.body_text()))
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::DimensionMismatch { .. } => {
                    (StatusCode::BAD_REQUEST, "DIMENSION_MISMATCH", core.to_string())
                }
                CoreError::UnknownJob(job_id) => (
                    StatusCode::NOT_FOUND,
                    "UNKNOWN_JOB",
                    format!("Job {job_id} is not registered"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::IncompleteAccumulation { .. } => {
                    tracing::error!(error = %core, "Accumulation invariant violated");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INCOMPLETE_ACCUMULATION",
                        core.to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Downstream service failures ---
            AppError::RegistrationFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "REGISTRATION_FAILED", msg.clone())
            }
            AppError::SubmissionFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "SUBMISSION_FAILED", msg.clone())
            }
            AppError::DispatchFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "DISPATCH_FAILED", msg.clone())
            }

            // --- HTTP-specific errors ---
            AppError::RequestTimeout => (
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_TIMEOUT",
                "Request timed out".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
