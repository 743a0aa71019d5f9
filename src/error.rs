use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::upload::UploadError;

/// ErrorResponse
///
/// The single error body shape returned to clients: `{ "message": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// ApiError
///
/// Error type returned by every handler. Upload rejections pass through with their own
/// status mapping; database faults are logged in full and surfaced as an opaque 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upload(e) => e.status_code(),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing text. Never includes paths, SQL or driver detail.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Upload(e) => e.client_message(),
            ApiError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Database(e) => tracing::error!(error = ?e, "Database operation failed"),
            ApiError::Upload(e) if status.is_server_error() => {
                tracing::error!(error = ?e, reason = e.kind(), "Upload storage failed")
            }
            ApiError::Upload(e) => {
                tracing::warn!(reason = e.kind(), message = %e, "Upload rejected")
            }
            other => tracing::debug!(status = %status, message = %other, "Request rejected"),
        }

        let body = ErrorResponse {
            message: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}
