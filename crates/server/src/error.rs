//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use casanova_tracking::TrackingError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Tracking operation failed.
    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::Tracking(TrackingError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Tracking(TrackingError::Validation(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Tracking(
                TrackingError::StoreUnavailable(_) | TrackingError::RetriesExhausted { .. },
            ) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Tracking(TrackingError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Tracking(TrackingError::NotFound(what)) | Self::NotFound(what) => {
                format!("Not found: {what}")
            }
            Self::Tracking(TrackingError::Validation(msg)) | Self::BadRequest(msg) => msg.clone(),
            _ if status == StatusCode::SERVICE_UNAVAILABLE => {
                "Customer store temporarily unavailable".to_string()
            }
            _ => "Internal server error".to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use casanova_tracking::StoreError;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("reservation r1".to_string());
        assert_eq!(err.to_string(), "Not found: reservation r1");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(TrackingError::NotFound("r1".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(TrackingError::Validation("no contact".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(TrackingError::StoreUnavailable("timeout".to_string()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(TrackingError::Store(StoreError::CounterInvariant).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_store_failure_body_hides_details() {
        let response = AppError::from(TrackingError::Store(StoreError::DataCorruption(
            "invalid phone in database: 0612".to_string(),
        )))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_default();
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
