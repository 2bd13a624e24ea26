//! Error types for the Graph communications SDK

/// Result type alias
pub type Result<T> = std::result::Result<T, GraphError>;

/// Graph SDK errors
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Graph API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Token acquisition failed: {0}")]
    Token(String),

    #[error("Join URL cannot be parsed: {0}")]
    InvalidJoinUrl(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl GraphError {
    /// Map a non-success HTTP status and its body to an error
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => GraphError::NotFound(body),
            401 | 403 => GraphError::Unauthorized(body),
            429 => GraphError::RateLimited,
            _ => GraphError::Api {
                status,
                message: body,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Parse(err.to_string())
    }
}
