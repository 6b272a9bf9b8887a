//! Deadline guard for asynchronous operations.
//!
//! [`with_timeout`] races a future against a deadline and stops polling it
//! when the deadline wins. [`with_timeout_detached`] runs the future on its
//! own task instead, so an abandoned operation keeps running to completion
//! and only its outcome is discarded. Neither variant propagates a
//! cancellation signal into the operation: work it has already started (a
//! request on the wire, for instance) is never rolled back.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;

/// Raised when an operation does not settle before its deadline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TimeoutError {
    /// The configured deadline in milliseconds.
    pub timeout_ms: u64,
    /// Human-readable description of the timeout.
    pub message: String,
}

impl TimeoutError {
    /// Creates a timeout error, falling back to the standard message when
    /// `message` is `None`.
    pub fn new(timeout_ms: u64, message: Option<&str>) -> Self {
        let message = match message {
            Some(message) => message.to_string(),
            None => format!("Operation timed out after {}ms", timeout_ms),
        };
        Self { timeout_ms, message }
    }
}

/// Races `operation` against a deadline of `timeout_ms` milliseconds.
///
/// Whichever settles first wins: an `Ok` or `Err` produced by the operation
/// before the deadline is returned verbatim, and the timer is dropped with
/// it. When the deadline fires first the operation is dropped without being
/// polled again and the call fails with [`TimeoutError`].
///
/// A zero deadline fails immediately without polling the operation at all.
///
/// # Example
///
/// ```rust
/// use cat_advisor::resilience::{with_timeout, TimeoutError};
///
/// # #[tokio::main]
/// # async fn main() {
/// let result: Result<u32, TimeoutError> =
///     with_timeout(std::future::pending(), 10, Some("model call hung")).await;
///
/// let error = result.unwrap_err();
/// assert_eq!(error.timeout_ms, 10);
/// assert_eq!(error.message, "model call hung");
/// # }
/// ```
pub async fn with_timeout<F, T, E>(
    operation: F,
    timeout_ms: u64,
    message: Option<&str>,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    if timeout_ms == 0 {
        return Err(TimeoutError::new(timeout_ms, message).into());
    }

    match tokio::time::timeout(Duration::from_millis(timeout_ms), operation).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::debug!(timeout_ms, "Deadline elapsed, abandoning operation");
            Err(TimeoutError::new(timeout_ms, message).into())
        }
    }
}

/// Like [`with_timeout`], but the operation runs on a spawned task.
///
/// On timeout the task is detached rather than dropped: it keeps running
/// until it finishes on its own and its result is thrown away. A task that
/// panics before the deadline is reported through `E: From<JoinError>`.
pub async fn with_timeout_detached<F, T, E>(
    operation: F,
    timeout_ms: u64,
    message: Option<&str>,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<TimeoutError> + From<JoinError> + Send + 'static,
{
    if timeout_ms == 0 {
        return Err(TimeoutError::new(timeout_ms, message).into());
    }

    let handle = tokio::spawn(operation);

    match tokio::time::timeout(Duration::from_millis(timeout_ms), handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(join_error.into()),
        Err(_) => {
            // The JoinHandle was dropped with the timeout future; the task is
            // now detached.
            tracing::debug!(timeout_ms, "Deadline elapsed, detaching operation");
            Err(TimeoutError::new(timeout_ms, message).into())
        }
    }
}
