//! JSON error responses for the API endpoints

use crate::error::VectorizeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error returned by the upload and reprocess handlers as `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Map a pipeline error; server-side failures get `prefix` prepended
    #[must_use]
    pub fn from_pipeline(error: &VectorizeError, prefix: &str) -> Self {
        let status = StatusCode::from_u16(error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if error.is_client_error() {
            Self::new(status, error.to_string())
        } else {
            tracing::error!(error = %error, "{}", prefix);
            Self::new(status, format!("{}: {}", prefix, error))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
