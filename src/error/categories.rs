//! Error category types for granular error handling.
//!
//! Every message carries the markers (status codes, "invalid", "connection",
//! ...) that the message-based classifier and the default retry predicate
//! look for, so a typed error and its rendered text always agree.

use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Authentication-related errors.
#[derive(Error, Debug, Clone)]
pub enum AuthenticationError {
    #[error("Invalid API key (401)")]
    InvalidApiKey,

    #[error("Permission denied (403): {message}")]
    PermissionDenied { message: String },
}

/// Request validation errors reported by the API.
#[derive(Error, Debug, Clone)]
pub enum RequestError {
    #[error("Invalid request (400): {message}")]
    ValidationError { message: String, details: Vec<ValidationDetail> },

    #[error("Model not found (404): {model}")]
    ModelNotFound { model: String },
}

/// Validation detail for field-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetail {
    pub field: String,
    pub description: String,
}

/// Rate limiting errors.
#[derive(Error, Debug, Clone)]
pub enum RateLimitError {
    #[error("Too many requests (429)")]
    TooManyRequests { retry_after: Option<Duration> },

    #[error("Quota exceeded (429)")]
    QuotaExceeded { retry_after: Option<Duration> },
}

impl RateLimitError {
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RateLimitError::TooManyRequests { retry_after } => *retry_after,
            RateLimitError::QuotaExceeded { retry_after } => *retry_after,
        }
    }

    /// Returns a copy carrying the given retry-after hint.
    pub fn with_retry_after(self, retry_after: Option<Duration>) -> Self {
        match self {
            RateLimitError::TooManyRequests { .. } => RateLimitError::TooManyRequests { retry_after },
            RateLimitError::QuotaExceeded { .. } => RateLimitError::QuotaExceeded { retry_after },
        }
    }
}

/// Network-related errors.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },
}

/// Server-side errors.
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    #[error("Internal server error ({status}): {message}")]
    InternalError { status: u16, message: String },

    #[error("Service unavailable (503)")]
    ServiceUnavailable { retry_after: Option<Duration> },

    #[error("Model overloaded (503): {model}")]
    ModelOverloaded { model: String },
}

/// Response interpretation errors.
#[derive(Error, Debug, Clone)]
pub enum ResponseError {
    #[error("Gemini API returned empty response")]
    EmptyResponse,

    #[error("Failed to parse JSON response: {message}")]
    DeserializationError { message: String },
}

/// Content withheld by the model.
#[derive(Error, Debug, Clone)]
pub enum ContentError {
    #[error("Content blocked due to safety: {reason}")]
    SafetyBlocked { reason: String },

    #[error("Content blocked due to recitation")]
    RecitationBlocked,
}
