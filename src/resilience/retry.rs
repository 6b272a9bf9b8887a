//! Retry logic with exponential backoff.
//!
//! The retry loop calls an operation factory once per attempt, sleeping
//! between attempts with a capped exponential delay. Which failures are
//! worth another attempt is decided by a predicate; the default one,
//! [`default_should_retry`], matches the error's message against known
//! transient conditions (rate limits, network trouble, 5xx statuses).

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Default maximum number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Default upper bound for a single delay, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Default backoff multiplier.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Predicate deciding whether a failure is worth another attempt.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Terminal failure produced when every attempt has been used up.
///
/// `last_error` is the failure of the final attempt exactly as the operation
/// returned it.
#[derive(Error, Debug, Clone)]
#[error("Operation failed after {attempts} attempts")]
pub struct RetryError<E> {
    /// Number of attempts actually made.
    pub attempts: u32,
    /// The failure returned by the final attempt.
    #[source]
    pub last_error: E,
}

const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "429", "quota"];
const NETWORK_MARKERS: &[&str] = &[
    "network",
    "timeout",
    "connection",
    "econnrefused",
    "enotfound",
    "fetch failed",
];
const SERVER_MARKERS: &[&str] = &["500", "502", "503", "504"];

/// Default retry condition: rate limits, network failures and 5xx statuses.
///
/// Matching is a case-insensitive substring search over the error's
/// `Display` output. 4xx client errors and everything else are not retried.
pub fn default_should_retry<E: fmt::Display + ?Sized>(error: &E) -> bool {
    let message = error.to_string().to_lowercase();

    RATE_LIMIT_MARKERS
        .iter()
        .chain(NETWORK_MARKERS)
        .chain(SERVER_MARKERS)
        .any(|marker| message.contains(marker))
}

/// Options controlling the retry loop.
pub struct RetryOptions<E> {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor applied per attempt.
    pub backoff_multiplier: f64,
    /// Decides whether a failure is retried. Replaces the default entirely.
    pub should_retry: RetryPredicate<E>,
}

impl<E: fmt::Display + 'static> Default for RetryOptions<E> {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            should_retry: Arc::new(|error: &E| default_should_retry(error)),
        }
    }
}

impl<E: fmt::Display + 'static> RetryOptions<E> {
    /// Options that make exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

impl<E> RetryOptions<E> {
    /// Sets the maximum number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the first retry.
    pub fn with_initial_delay_ms(mut self, initial_delay_ms: u64) -> Self {
        self.initial_delay_ms = initial_delay_ms;
        self
    }

    /// Sets the delay cap.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Replaces the retry predicate.
    pub fn with_should_retry<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Attempt budget actually used by the loop; never below one.
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// `min(initial_delay_ms * backoff_multiplier^(attempt - 1), max_delay_ms)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.initial_delay_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            initial_delay_ms: self.initial_delay_ms,
            max_delay_ms: self.max_delay_ms,
            backoff_multiplier: self.backoff_multiplier,
            should_retry: Arc::clone(&self.should_retry),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay_ms", &self.initial_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("should_retry", &"<predicate>")
            .finish()
    }
}

/// Executes operations with retry logic and exponential backoff.
pub struct RetryExecutor<E> {
    options: RetryOptions<E>,
}

impl<E: fmt::Display + 'static> RetryExecutor<E> {
    /// Creates a retry executor with default options.
    pub fn with_defaults() -> Self {
        Self::new(RetryOptions::default())
    }
}

impl<E> RetryExecutor<E> {
    /// Creates a new retry executor with the given options.
    pub fn new(options: RetryOptions<E>) -> Self {
        Self { options }
    }

    /// Returns the retry options.
    pub fn options(&self) -> &RetryOptions<E> {
        &self.options
    }

    /// Executes an operation with retry logic.
    ///
    /// # Behavior
    ///
    /// - Calls `operation` for a fresh future on every attempt
    /// - Returns the first success immediately
    /// - A failure on the last attempt becomes a [`RetryError`] without
    ///   consulting the predicate
    /// - An earlier failure the predicate rejects is returned unchanged
    /// - Otherwise sleeps for the backoff delay and tries again
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RetryError<E>> + fmt::Display,
    {
        let max_attempts = self.options.effective_max_attempts();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Operation succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(error) if attempt >= max_attempts => {
                    tracing::error!(
                        attempts = max_attempts,
                        error = %error,
                        "Retry attempts exhausted"
                    );
                    return Err(E::from(RetryError {
                        attempts: max_attempts,
                        last_error: error,
                    }));
                }
                Err(error) => {
                    if !(self.options.should_retry)(&error) {
                        tracing::debug!(attempt, error = %error, "Error is not retryable");
                        return Err(error);
                    }

                    let delay = self.options.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Attempt {}/{} failed, retrying in {}ms: {}",
                        attempt,
                        max_attempts,
                        delay.as_millis(),
                        error
                    );

                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl<E> fmt::Debug for RetryExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("options", &self.options)
            .finish()
    }
}

/// Runs `operation` under `options`; shorthand for
/// `RetryExecutor::new(options.clone()).execute(operation)`.
///
/// # Example
///
/// ```rust
/// use cat_advisor::error::GeminiError;
/// use cat_advisor::resilience::{with_retry, RetryOptions};
///
/// # #[tokio::main]
/// # async fn main() {
/// let options = RetryOptions::default().with_initial_delay_ms(1);
/// let result = with_retry(|| async { Ok::<_, GeminiError>("advice") }, &options).await;
/// assert_eq!(result.unwrap(), "advice");
/// # }
/// ```
pub async fn with_retry<F, Fut, T, E>(operation: F, options: &RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<RetryError<E>> + fmt::Display,
{
    RetryExecutor::new(options.clone()).execute(operation).await
}
