//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::layers::LayerError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// The stationary debouncer is no longer accepting notifications
    Unavailable(String),
    Layer(LayerError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("UNAVAILABLE", msg),
            ),
            AppError::Layer(e) => {
                let details = e.context().to_string();
                let (status, code) = match &e {
                    LayerError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    _ if e.is_retryable() => (StatusCode::SERVICE_UNAVAILABLE, "LAYER_ERROR"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "LAYER_ERROR"),
                };
                (status, ApiError::new(code, e.to_string()).with_details(details))
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<LayerError> for AppError {
    fn from(err: LayerError) -> Self {
        AppError::Layer(err)
    }
}
