//! Classification of failures into a stable category and HTTP status.
//!
//! Classification works on the rendered message, so anything that reaches
//! the boundary (typed API errors, transport failures, panics surfaced as
//! [`GeminiError::Unexpected`]) lands in a category. The only typed checks
//! are the deadline variant, the exhausted-retry wrapper and
//! [`GeminiError::Unknown`], which has no message worth matching.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::GeminiError;

/// Stable failure category exposed to callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    TimeoutError,
    RateLimitError,
    AuthenticationError,
    NetworkError,
    ValidationError,
    ServerError,
    EmptyResponseError,
    ParseError,
    ServiceError,
    UnknownError,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::TimeoutError => "TimeoutError",
            ErrorType::RateLimitError => "RateLimitError",
            ErrorType::AuthenticationError => "AuthenticationError",
            ErrorType::NetworkError => "NetworkError",
            ErrorType::ValidationError => "ValidationError",
            ErrorType::ServerError => "ServerError",
            ErrorType::EmptyResponseError => "EmptyResponseError",
            ErrorType::ParseError => "ParseError",
            ErrorType::ServiceError => "ServiceError",
            ErrorType::UnknownError => "UnknownError",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification record for one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiErrorDetails {
    pub error_type: ErrorType,
    pub error_message: String,
    pub is_retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl GeminiErrorDetails {
    fn new(error_type: ErrorType, error_message: String, is_retryable: bool, status_code: Option<u16>) -> Self {
        Self {
            error_type,
            error_message,
            is_retryable,
            status_code,
        }
    }
}

const UNKNOWN_MESSAGE: &str = "An unknown error occurred";

/// Message rules, checked in order; the first hit wins.
const MESSAGE_RULES: &[(&[&str], ErrorType, bool, u16)] = &[
    (&["rate limit", "429", "quota"], ErrorType::RateLimitError, true, 429),
    (
        &["api key", "401", "403", "unauthorized", "forbidden"],
        ErrorType::AuthenticationError,
        false,
        401,
    ),
    (
        &["network", "connection", "econnrefused", "enotfound", "fetch failed"],
        ErrorType::NetworkError,
        true,
        503,
    ),
    (&["400", "invalid", "bad request"], ErrorType::ValidationError, false, 400),
    (&["500", "502", "503", "504"], ErrorType::ServerError, true, 503),
    (&["empty response"], ErrorType::EmptyResponseError, true, 503),
    (&["json", "parse"], ErrorType::ParseError, false, 500),
];

/// Assigns a category, retryability and recommended status to `error`.
///
/// An exhausted [`RetryError`](crate::resilience::RetryError) is classified by
/// its final failure but is never retryable itself.
pub fn classify(error: &GeminiError) -> GeminiErrorDetails {
    match error {
        GeminiError::Retry(retry) => {
            let inner = classify(&retry.last_error);
            GeminiErrorDetails::new(
                inner.error_type,
                format!("{}. Last error: {}", retry, inner.error_message),
                false,
                inner.status_code,
            )
        }
        GeminiError::Timeout(timeout) => {
            GeminiErrorDetails::new(ErrorType::TimeoutError, timeout.to_string(), true, Some(504))
        }
        GeminiError::Unknown => {
            GeminiErrorDetails::new(ErrorType::UnknownError, UNKNOWN_MESSAGE.to_string(), false, None)
        }
        other => classify_message(other.to_string()),
    }
}

fn classify_message(message: String) -> GeminiErrorDetails {
    let lowered = message.to_lowercase();

    for (markers, error_type, is_retryable, status) in MESSAGE_RULES {
        if markers.iter().any(|marker| lowered.contains(marker)) {
            return GeminiErrorDetails::new(*error_type, message, *is_retryable, Some(*status));
        }
    }

    GeminiErrorDetails::new(ErrorType::ServiceError, message, false, Some(503))
}
