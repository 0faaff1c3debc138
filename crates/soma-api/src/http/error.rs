//! Application error type mapping to HTTP status codes and the envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use soma_core::service::TurnError;
use soma_types::error::StorageError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// A turn ended without a reply.
    Turn(TurnError),
    /// A read against the durable store failed.
    Storage(StorageError),
    /// Malformed request (bad JSON, undecodable image, missing query).
    Validation(String),
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        AppError::Turn(e)
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e)
    }
}

impl AppError {
    /// HTTP status and machine-readable code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Turn(TurnError::InvalidInput(_)) | AppError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Turn(TurnError::UpstreamUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE")
            }
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Turn(e) => e.to_string(),
            AppError::Storage(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::warn!(code, error = %message, "request failed");
        } else {
            tracing::debug!(code, error = %message, "request rejected");
        }

        let body = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string(), 0);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soma_types::llm::LlmError;

    #[test]
    fn test_status_mapping() {
        let invalid = AppError::from(TurnError::InvalidInput("empty".into()));
        assert_eq!(invalid.status_and_code(), (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"));

        let upstream = AppError::from(TurnError::UpstreamUnavailable(LlmError::Timeout(45)));
        assert_eq!(
            upstream.status_and_code(),
            (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE")
        );

        let storage = AppError::from(StorageError::Query("locked".into()));
        assert_eq!(
            storage.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
        );
    }

    #[test]
    fn test_response_status() {
        let resp = AppError::Validation("bad".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
