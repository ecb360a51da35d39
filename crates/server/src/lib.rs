//! Medical Assistant Server
//!
//! Provides the chat, calendar, health and metrics HTTP endpoints.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_error, record_request};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Dialogue(#[from] medibot_core::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Dialogue(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::Dialogue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned in the `error` field
    pub fn public_message(&self) -> String {
        match self {
            ServerError::InvalidRequest(message) => message.clone(),
            ServerError::Dialogue(e) if e.is_client_error() => e.to_string(),
            ServerError::Dialogue(e) if e.is_upstream() => {
                format!("Error generating response from AI model: {}", e)
            }
            ServerError::Dialogue(_) | ServerError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Dialogue(e) => e.kind(),
            ServerError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        record_error(self.kind());
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        (status, Json(serde_json::json!({ "error": self.public_message() }))).into_response()
    }
}
