//! Resilience primitives for calls to an unreliable upstream.
//!
//! Two building blocks, composed by the content service around every
//! Gemini request:
//!
//! 1. **Timeout guard**: races one in-flight operation against a deadline
//! 2. **Retry policy**: re-invokes an operation factory with capped
//!    exponential backoff while a predicate deems the failure transient
//!
//! Both are stateless and generic over the caller's error type, which plugs
//! in through `From<TimeoutError>` and `From<RetryError<E>>`.
//!
//! # Example
//!
//! ```rust
//! use cat_advisor::error::GeminiError;
//! use cat_advisor::resilience::{with_retry, with_timeout, RetryOptions};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let options = RetryOptions::default().with_initial_delay_ms(10);
//!
//! let advice = with_retry(
//!     || with_timeout(async { Ok::<_, GeminiError>("drink more water") }, 1_000, None),
//!     &options,
//! )
//! .await;
//!
//! assert_eq!(advice.unwrap(), "drink more water");
//! # }
//! ```

mod retry;
mod timeout;

pub use retry::{
    default_should_retry, with_retry, RetryError, RetryExecutor, RetryOptions, RetryPredicate,
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_MS,
};
pub use timeout::{with_timeout, with_timeout_detached, TimeoutError};
