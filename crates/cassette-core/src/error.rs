//! Unified error handling for cassette-core

use thiserror::Error;

/// Fallback message when neither the transport nor the response body
/// gives anything better.
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed";

/// Failure of a single API call.
///
/// Every variant renders as a human-readable message suitable for direct
/// display; callers that need the HTTP status use [`ApiError::status`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// DNS, connection or timeout failure. No response was received.
    #[error("{message}")]
    Transport { message: String },

    /// Non-2xx response, message resolved from the response body.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// 401 that could not be recovered by a token refresh.
    /// Local credentials have already been cleared when this is returned.
    #[error("Session expired")]
    SessionExpired,

    /// 2xx response whose body did not match the expected shape.
    #[error("Unexpected response: {message}")]
    Decode { message: String },
}

impl ApiError {
    /// Create a transport error, falling back to the default message
    pub fn transport(msg: impl Into<String>) -> Self {
        let message = msg.into();
        let message = if message.trim().is_empty() {
            DEFAULT_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        ApiError::Transport { message }
    }

    /// Create an HTTP error
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        ApiError::Http {
            status,
            message: msg.into(),
        }
    }

    /// HTTP status associated with this failure.
    ///
    /// Transport and decode failures report 0; a session expiry reports 401.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Transport { .. } | ApiError::Decode { .. } => 0,
            ApiError::Http { status, .. } => *status,
            ApiError::SessionExpired => 401,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status: 401, .. })
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    /// Network failures and 5xx responses; retrying may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode {
            message: err.to_string(),
        }
    }
}

/// Core error type for cassette-core
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out waiting for {0}")]
    PollTimeout(String),
}

/// Result type alias for cassette-core
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Whether this error means the user has to log in again
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Api(ApiError::SessionExpired))
    }
}
