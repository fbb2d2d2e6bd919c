use crate::services::storage_service::StorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for request errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.status.canonical_reason().unwrap_or("Unknown"),
            "code": self.status.as_u16(),
            "message": self.message,
        }));

        (self.status, body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            tracing::debug!("file lookup failed: {}", err);
            AppError::not_found("File not found")
        } else {
            tracing::error!("storage failure: {}", err);
            AppError::internal("Storage operation failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_maps_to_404() {
        let err = AppError::from(StorageError::ContentNotFound { id: "x".into() });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "File not found");
    }

    #[test]
    fn storage_io_failure_maps_to_500() {
        let err = AppError::from(StorageError::Io {
            op: "read metadata",
            id: "x".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
