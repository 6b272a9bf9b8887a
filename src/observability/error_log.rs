//! Structured error records.
//!
//! Every failure that reaches the HTTP boundary is classified and written as
//! one JSON record through a [`Logger`]:
//!
//! ```json
//! {"level":"error","timestamp":"...","requestId":"...","operation":"diagnosis",
//!  "durationMs":1200,"error":{"errorType":"TimeoutError",...}}
//! ```

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::logging::{Logger, StructuredLogger};
use crate::error::{classify, GeminiError, GeminiErrorDetails};

/// Caller-supplied context for one error record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogContext {
    pub request_id: String,
    pub operation: String,
    /// ISO 8601 timestamp, copied into the record verbatim.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ErrorLogContext {
    /// Creates a context stamped with the current time, in UTC with
    /// millisecond precision.
    pub fn new(request_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            operation: operation.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_ms: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Uses a caller-supplied timestamp as-is.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

/// Classifies failures and writes them through an injected [`Logger`].
#[derive(Clone)]
pub struct ErrorLogger {
    logger: Arc<dyn Logger>,
}

impl ErrorLogger {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// Classifies `error`, emits exactly one record, and returns the
    /// classification. The error itself is left untouched.
    pub fn log_and_classify(&self, error: &GeminiError, context: &ErrorLogContext) -> GeminiErrorDetails {
        let details = classify(error);
        self.logger.error("Gemini API error", error_record(&details, context));
        details
    }
}

impl Default for ErrorLogger {
    fn default() -> Self {
        Self::new(Arc::new(StructuredLogger::new("cat_advisor.errors")))
    }
}

impl std::fmt::Debug for ErrorLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLogger").finish_non_exhaustive()
    }
}

static DEFAULT_ERROR_LOGGER: Lazy<ErrorLogger> = Lazy::new(ErrorLogger::default);

/// [`ErrorLogger::log_and_classify`] on the process-wide default logger.
pub fn log_and_classify(error: &GeminiError, context: &ErrorLogContext) -> GeminiErrorDetails {
    DEFAULT_ERROR_LOGGER.log_and_classify(error, context)
}

/// Builds the JSON record; `durationMs` is omitted when unknown.
pub fn error_record(details: &GeminiErrorDetails, context: &ErrorLogContext) -> serde_json::Value {
    let mut record = json!({
        "level": "error",
        "timestamp": context.timestamp,
        "requestId": context.request_id,
        "operation": context.operation,
        "error": details,
    });

    if let (Some(duration_ms), Some(obj)) = (context.duration_ms, record.as_object_mut()) {
        obj.insert("durationMs".to_string(), json!(duration_ms));
    }

    record
}
