//! Transport layer error types.

use std::time::Duration;

/// Failure below the HTTP status level: the exchange itself did not complete.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Request error: {0}")]
    Request(String),
}
