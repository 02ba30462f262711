//! Error types for Bot API calls.
//!
//! Routing-level errors (extraction, dispatch, router structure) live in
//! `switchyard-framework`; configuration and runtime errors live in
//! `switchyard-runtime`.

use thiserror::Error;

/// Error type for Bot API calls.
///
/// HTTP-level failures reported by the platform map onto the named variants
/// through [`ApiError::from_status`]; anything without a dedicated variant
/// lands in [`ApiError::Api`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request did not complete in time.
    #[error("API call timed out")]
    Timeout,

    /// 400: the request was malformed or referenced invalid data.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 401: the access token was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 403: the bot lacks permission for the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 404: the chat, user or message does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// 405: the method is not allowed for the resource.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// 429: the bot is being rate limited.
    #[error("too many requests: {0}")]
    TooManyRequests(String),

    /// 503: the platform is temporarily unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other error status returned by the platform.
    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    /// Failed to serialize a request or deserialize a response.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Maps an HTTP status code and error message onto the matching variant.
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            405 => Self::MethodNotAllowed(message),
            429 => Self::TooManyRequests(message),
            503 => Self::ServiceUnavailable(message),
            code => Self::Api { code, message },
        }
    }

    /// Returns the HTTP status code this error corresponds to, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::MethodNotAllowed(_) => Some(405),
            Self::TooManyRequests(_) => Some(429),
            Self::ServiceUnavailable(_) => Some(503),
            Self::Api { code, .. } => Some(*code),
            Self::Timeout | Self::Serialization(_) | Self::Transport(_) | Self::Other(_) => None,
        }
    }

    /// Returns `true` if retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::TooManyRequests(_) | Self::ServiceUnavailable(_) | Self::Transport(_)
        )
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
