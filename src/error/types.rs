//! Main error type for the Gemini integration.

use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;

use super::categories::*;
use crate::resilience::{RetryError, TimeoutError};
use crate::transport::TransportError;

/// Result type alias for Gemini operations.
pub type GeminiResult<T> = Result<T, GeminiError>;

/// Top-level error type for the Gemini integration.
#[derive(Error, Debug, Clone)]
pub enum GeminiError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// The deadline elapsed before the call settled.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// Every attempt failed; `last_error` is the final attempt's failure.
    #[error(transparent)]
    Retry(RetryError<Box<GeminiError>>),

    #[error("{message}")]
    Unexpected { message: String },

    /// A failure that carries no usable message.
    #[error("Unknown error")]
    Unknown,
}

impl GeminiError {
    /// Convenience constructor for [`GeminiError::Unexpected`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        GeminiError::Unexpected {
            message: message.into(),
        }
    }

    /// Returns the retry-after hint carried by the error, if any.
    ///
    /// Exhausted retries report the hint of their final attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GeminiError::RateLimit(e) => e.retry_after(),
            GeminiError::Server(ServerError::ServiceUnavailable { retry_after }) => *retry_after,
            GeminiError::Retry(e) => e.last_error.retry_after(),
            _ => None,
        }
    }

    /// Returns true for the deadline variant.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GeminiError::Timeout(_))
    }
}

impl From<RetryError<GeminiError>> for GeminiError {
    fn from(err: RetryError<GeminiError>) -> Self {
        GeminiError::Retry(RetryError {
            attempts: err.attempts,
            last_error: Box::new(err.last_error),
        })
    }
}

impl From<JoinError> for GeminiError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            return GeminiError::unexpected("Task was cancelled");
        }

        match err.try_into_panic() {
            Ok(payload) => match payload.downcast::<String>() {
                Ok(message) => GeminiError::unexpected(format!("Task panicked: {}", message)),
                Err(payload) => match payload.downcast::<&'static str>() {
                    Ok(message) => GeminiError::unexpected(format!("Task panicked: {}", message)),
                    Err(_) => GeminiError::Unknown,
                },
            },
            Err(err) => GeminiError::unexpected(err.to_string()),
        }
    }
}

impl From<TransportError> for GeminiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(duration) => {
                GeminiError::Network(NetworkError::Timeout { duration })
            }
            other => GeminiError::Network(NetworkError::ConnectionFailed {
                message: other.to_string(),
            }),
        }
    }
}

impl From<serde_json::Error> for GeminiError {
    fn from(err: serde_json::Error) -> Self {
        GeminiError::Response(ResponseError::DeserializationError {
            message: err.to_string(),
        })
    }
}

impl From<url::ParseError> for GeminiError {
    fn from(err: url::ParseError) -> Self {
        GeminiError::Configuration(ConfigurationError::InvalidBaseUrl {
            url: err.to_string(),
        })
    }
}
