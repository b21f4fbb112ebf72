//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use choreo_media::MediaError;
use choreo_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Export failed: {0}")]
    ExportFailed(#[source] MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Storage(StorageError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::ExportFailed(_) | ApiError::Storage(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message and internal details.
    fn parts(&self) -> (String, Option<String>) {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => (msg.clone(), None),
            ApiError::RateLimited => (self.to_string(), None),
            ApiError::ExportFailed(e) => {
                let details = match e.stderr() {
                    Some(stderr) => format!("{e}\n{stderr}"),
                    None => e.to_string(),
                };
                ("Export failed".to_string(), Some(details))
            }
            ApiError::Storage(StorageError::InvalidKey(key)) => (format!("Invalid identifier: {key}"), None),
            ApiError::Storage(StorageError::NotFound(key)) => (format!("Not found: {key}"), None),
            ApiError::Storage(_) | ApiError::Io(_) => {
                ("Internal error".to_string(), Some(self.to_string()))
            }
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        Self::ExportFailed(e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = self.parts();

        // Don't expose internal error details in production
        let details = if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
            None
        } else {
            details
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}
