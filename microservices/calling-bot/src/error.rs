//! Error types for the calling bot

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use brivas_graph_sdk::GraphError;
use serde_json::json;

use crate::directory::Role;

/// Result type alias
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Orchestration errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("No user configured for role {role}")]
    DirectoryExhausted { role: Role },

    #[error("Invalid join URL: {0}")]
    InvalidJoinUrl(String),

    #[error("Platform error: {0}")]
    Platform(#[source] GraphError),

    #[error("Call not found: {0}")]
    NotFound(String),

    #[error("Platform operation timed out: {0}")]
    Timeout(&'static str),
}

impl OrchestratorError {
    /// Reinterpret a remote not-found as "this call is gone"
    pub fn for_call(self, call_id: &str) -> Self {
        match self {
            OrchestratorError::Platform(err) if err.is_not_found() => {
                OrchestratorError::NotFound(call_id.to_string())
            }
            other => other,
        }
    }
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        let status = match &self {
            OrchestratorError::InvalidJoinUrl(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::DirectoryExhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
            OrchestratorError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            OrchestratorError::Platform(_) => {
                tracing::error!("Platform error: {:?}", self);
                StatusCode::BAD_GATEWAY
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
