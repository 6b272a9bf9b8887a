//! Observability layer.
//!
//! - **Logging**: subscriber setup and the [`Logger`] trait with sensitive
//!   data redaction
//! - **Error records**: classification of failures plus one structured record
//!   per failure
//!
//! # Example
//!
//! ```rust
//! use cat_advisor::error::{ErrorType, GeminiError};
//! use cat_advisor::observability::{log_and_classify, ErrorLogContext};
//!
//! let context = ErrorLogContext::new("req-42", "diagnosis").with_duration_ms(30_000);
//! let details = log_and_classify(&GeminiError::unexpected("quota exceeded"), &context);
//!
//! assert_eq!(details.error_type, ErrorType::RateLimitError);
//! assert_eq!(details.status_code, Some(429));
//! ```

pub mod error_log;
pub mod logging;

pub use error_log::{error_record, log_and_classify, ErrorLogContext, ErrorLogger};
pub use logging::{LogFormat, LogLevel, Logger, LoggingConfig, StructuredLogger};
