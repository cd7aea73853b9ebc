// =============================================================================
// Error taxonomy for provider calls and request handling
// =============================================================================
//
// Validation errors are the caller's fault and map to 400. Everything else
// (missing credential, provider-side error, transport failure) maps to a
// uniform 500 with the underlying detail passed through.
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScannerError {
    /// No provider credential configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or invalid request parameters.
    #[error("{0}")]
    Validation(String),

    /// The provider answered, but with an error or an unrecognised payload.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Connection, timeout or body-read failure. Built through
    /// [`ScannerError::transport`] so the request URL (which carries the
    /// credential) never reaches the message.
    #[error("Network error: {0}")]
    Transport(reqwest::Error),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    /// One or more indicator series had no usable latest value.
    #[error("Insufficient indicator data: missing {0}")]
    InsufficientData(String),
}

pub type Result<T> = std::result::Result<T, ScannerError>;

impl ScannerError {
    pub fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScannerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(message) => serde_json::json!({ "error": message }),
            other => serde_json::json!({
                "error": "Failed to fetch data from provider",
                "details": other.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
