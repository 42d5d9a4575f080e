//! Request extractors that report rejections through [`AppError`].

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body extractor whose rejections use the standard error envelope.
///
/// Malformed matrices fail inside deserialization and surface as
/// `400 VALIDATION_ERROR` instead of axum's plain-text `422`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
