//! Structured logging for the service.
//!
//! [`LoggingConfig`] installs the global `tracing` subscriber once at startup.
//! [`Logger`] is the trait-based seam used for structured records whose
//! fields must be machine-readable (error records in particular), so tests
//! can substitute a recording implementation.

use serde_json::Value;
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lower is more severe.
    fn severity(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
            LogLevel::Trace => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::level_filters::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (for development)
    Pretty,
    /// JSON format, one object per line
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The minimum log level to capture
    pub level: LogLevel,
    /// The output format for log messages
    pub format: LogFormat,
    /// Whether to include the module target in log output
    pub include_target: bool,
    /// Whether to include file and line number in log output
    pub include_file_line: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            include_target: true,
            include_file_line: false,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file_line(mut self, include: bool) -> Self {
        self.include_file_line = include;
        self
    }

    /// Installs the global subscriber. `RUST_LOG` directives are honored on
    /// top of the configured level.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already set.
    pub fn init(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // RUST_LOG directives win over the configured default level.
        let default_level = tracing::level_filters::LevelFilter::from(self.level);
        let filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        match self.format {
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_ansi(true)
                            .with_target(self.include_target)
                            .with_file(self.include_file_line)
                            .with_line_number(self.include_file_line),
                    )
                    .try_init()?;
            }
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json().with_target(self.include_target))
                    .try_init()?;
            }
            LogFormat::Compact => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact().with_target(self.include_target))
                    .try_init()?;
            }
        }

        Ok(())
    }
}

/// Logger trait for structured logging.
///
/// Implementations receive the message plus a JSON object of fields.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str, fields: Value);

    fn info(&self, message: &str, fields: Value);

    fn warn(&self, message: &str, fields: Value);

    fn error(&self, message: &str, fields: Value);
}

const SENSITIVE_KEYS: &[&str] = &[
    "api_key",
    "apiKey",
    "key",
    "token",
    "access_token",
    "accessToken",
    "secret",
    "password",
    "credential",
    "authorization",
    "x-goog-api-key",
];

const REDACTED: &str = "***REDACTED***";

/// [`Logger`] backed by `tracing`; sensitive fields are redacted before the
/// event is emitted.
pub struct StructuredLogger {
    name: String,
    level: LogLevel,
}

impl StructuredLogger {
    /// Creates a logger; `name` is attached to every event as `logger`.
    ///
    /// ```
    /// use cat_advisor::observability::{Logger, StructuredLogger};
    /// use serde_json::json;
    ///
    /// let logger = StructuredLogger::new("cat_advisor.gemini");
    /// logger.info("Generating content", json!({ "model": "gemini-2.5-flash" }));
    /// ```
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: LogLevel::Info,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level.severity() <= self.level.severity()
    }

    /// Masks values stored under sensitive keys, recursing into nested objects.
    fn redact_sensitive_fields(&self, mut fields: Value) -> Value {
        if let Some(obj) = fields.as_object_mut() {
            for (key, value) in obj.iter_mut() {
                if SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                    *value = Value::String(REDACTED.to_string());
                } else if value.is_object() {
                    *value = self.redact_sensitive_fields(value.take());
                }
            }
        }

        fields
    }
}

impl Logger for StructuredLogger {
    fn debug(&self, message: &str, fields: Value) {
        if !self.should_log(LogLevel::Debug) {
            return;
        }
        let fields = self.redact_sensitive_fields(fields);
        tracing::debug!(logger = %self.name, fields = %fields, "{}", message);
    }

    fn info(&self, message: &str, fields: Value) {
        if !self.should_log(LogLevel::Info) {
            return;
        }
        let fields = self.redact_sensitive_fields(fields);
        tracing::info!(logger = %self.name, fields = %fields, "{}", message);
    }

    fn warn(&self, message: &str, fields: Value) {
        if !self.should_log(LogLevel::Warn) {
            return;
        }
        let fields = self.redact_sensitive_fields(fields);
        tracing::warn!(logger = %self.name, fields = %fields, "{}", message);
    }

    fn error(&self, message: &str, fields: Value) {
        if !self.should_log(LogLevel::Error) {
            return;
        }
        let fields = self.redact_sensitive_fields(fields);
        // Error records also carry their key values as top-level fields, so
        // JSON consumers can filter on them without decoding `fields`.
        tracing::error!(
            logger = %self.name,
            request_id = fields.get("requestId").and_then(serde_json::Value::as_str),
            operation = fields.get("operation").and_then(serde_json::Value::as_str),
            duration_ms = fields.get("durationMs").and_then(serde_json::Value::as_u64),
            error_type = fields.pointer("/error/errorType").and_then(serde_json::Value::as_str),
            status_code = fields.pointer("/error/statusCode").and_then(serde_json::Value::as_u64),
            fields = %fields,
            "{}",
            message
        );
    }
}
