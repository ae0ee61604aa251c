use reqwest::StatusCode;

/// Failure of a call made through [`crate::client::ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-success status. `message` is the
    /// response body when it carried one, the status reason phrase otherwise.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    Transport(reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout(e.to_string())
        } else {
            ApiError::Transport(e)
        }
    }
}

impl ApiError {
    /// Status code of a backend rejection, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No active session")]
    NoSession,

    #[error("Session has no token for audience {0}")]
    AudienceUnavailable(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Identity provider is not configured")]
    NotConfigured,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
