//! Configuration for the Gemini client and the HTTP server.
//!
//! Both configurations can be built programmatically or read from the
//! environment. Environment parsing goes through a lookup function so it can
//! be exercised without touching the process environment.

use secrecy::SecretString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::{ConfigurationError, GeminiError};
use crate::observability::{LogFormat, LogLevel};
use crate::resilience::{
    RetryOptions, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_MS,
};

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default API version.
pub const DEFAULT_API_VERSION: &str = "v1beta";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default deadline for a single model call, in milliseconds.
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 30_000;

/// Default HTTP client timeout (120 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default cap on generated tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: i32 = 2048;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default request body limit (64 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Authentication method for API key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AuthMethod {
    /// Use x-goog-api-key header (recommended).
    #[default]
    Header,
    /// Use ?key= query parameter.
    QueryParam,
}

/// Retry settings as plain data.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryConfig {
    /// Checks the invariants the retry loop relies on.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts must be at least 1"));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(invalid("backoff multiplier must be a finite number >= 1"));
        }
        if self.initial_delay > self.max_delay {
            return Err(invalid("initial retry delay must not exceed the maximum delay"));
        }
        Ok(())
    }

    /// Converts into loop options; `E` picks the default predicate's error type.
    pub fn to_options<E: std::fmt::Display + 'static>(&self) -> RetryOptions<E> {
        RetryOptions::default()
            .with_max_attempts(self.max_attempts)
            .with_initial_delay_ms(duration_ms(self.initial_delay))
            .with_max_delay_ms(duration_ms(self.max_delay))
            .with_backoff_multiplier(self.multiplier)
    }
}

/// Configuration for the Gemini client.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key (required).
    pub api_key: SecretString,
    /// Base URL for the API.
    pub base_url: Url,
    /// API version.
    pub api_version: String,
    /// Model used for every call.
    pub model: String,
    /// Deadline for a single attempt, enforced around the whole call.
    pub attempt_timeout_ms: u64,
    /// HTTP client timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
    pub max_output_tokens: i32,
    pub temperature: f32,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// Authentication method.
    pub auth_method: AuthMethod,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .field("attempt_timeout_ms", &self.attempt_timeout_ms)
            .field("retry_config", &self.retry_config)
            .field("auth_method", &self.auth_method)
            .finish_non_exhaustive()
    }
}

impl GeminiConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GeminiConfigBuilder {
        GeminiConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, GeminiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GeminiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigurationError::MissingApiKey)?;

        let mut builder = Self::builder().api_key(SecretString::new(api_key));

        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            builder = builder.base_url(&base_url)?;
        }
        if let Some(version) = lookup("GEMINI_API_VERSION") {
            builder = builder.api_version(&version);
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            builder = builder.model(&model);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "GEMINI_TIMEOUT_MS")? {
            builder = builder.attempt_timeout_ms(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "GEMINI_CONNECT_TIMEOUT_SECS")? {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(tokens) = parse_var::<i32, _>(&lookup, "GEMINI_MAX_OUTPUT_TOKENS")? {
            builder = builder.max_output_tokens(tokens);
        }
        if let Some(temperature) = parse_var::<f32, _>(&lookup, "GEMINI_TEMPERATURE")? {
            builder = builder.temperature(temperature);
        }

        let mut retry = RetryConfig::default();
        if let Some(attempts) = parse_var(&lookup, "GEMINI_MAX_ATTEMPTS")? {
            retry.max_attempts = attempts;
        }
        if let Some(ms) = parse_var(&lookup, "GEMINI_INITIAL_DELAY_MS")? {
            retry.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "GEMINI_MAX_DELAY_MS")? {
            retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = parse_var(&lookup, "GEMINI_BACKOFF_MULTIPLIER")? {
            retry.multiplier = multiplier;
        }

        builder.retry_config(retry).build()
    }

    /// Retry options for calls whose failures are [`GeminiError`]s.
    pub fn retry_options(&self) -> RetryOptions<GeminiError> {
        self.retry_config.to_options()
    }
}

/// Builder for GeminiConfig.
#[derive(Default)]
pub struct GeminiConfigBuilder {
    api_key: Option<SecretString>,
    base_url: Option<Url>,
    api_version: Option<String>,
    model: Option<String>,
    attempt_timeout_ms: Option<u64>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry_config: Option<RetryConfig>,
    max_output_tokens: Option<i32>,
    temperature: Option<f32>,
    pool_max_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    auth_method: Option<AuthMethod>,
}

impl GeminiConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, base_url: &str) -> Result<Self, GeminiError> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Set the API version.
    pub fn api_version(mut self, version: &str) -> Self {
        self.api_version = Some(version.to_string());
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Set the per-attempt deadline in milliseconds.
    pub fn attempt_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.attempt_timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the HTTP client timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = Some(config);
        self
    }

    pub fn max_output_tokens(mut self, tokens: i32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set maximum idle connections per host.
    pub fn pool_max_idle_per_host(mut self, size: usize) -> Self {
        self.pool_max_idle_per_host = Some(size);
        self
    }

    /// Set idle connection timeout.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the authentication method.
    pub fn auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<GeminiConfig, GeminiError> {
        let api_key = self.api_key.ok_or(ConfigurationError::MissingApiKey)?;

        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        let retry_config = self.retry_config.unwrap_or_default();
        retry_config.validate()?;

        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model.trim().is_empty() {
            return Err(invalid("model must not be empty").into());
        }

        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid("temperature must be between 0 and 2").into());
        }

        let max_output_tokens = self.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS);
        if max_output_tokens <= 0 {
            return Err(invalid("max_output_tokens must be positive").into());
        }

        let attempt_timeout_ms = self.attempt_timeout_ms.unwrap_or(DEFAULT_ATTEMPT_TIMEOUT_MS);
        if attempt_timeout_ms == 0 {
            return Err(invalid("attempt timeout must be positive").into());
        }

        // The HTTP client deadline must not cut an attempt short.
        let timeout = self.timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        if Duration::from_millis(attempt_timeout_ms) > timeout {
            return Err(invalid("attempt timeout must not exceed the HTTP client timeout").into());
        }

        Ok(GeminiConfig {
            api_key,
            base_url,
            api_version: self.api_version.unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            model,
            attempt_timeout_ms,
            timeout,
            connect_timeout: self
                .connect_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            retry_config,
            max_output_tokens,
            temperature,
            pool_max_idle_per_host: self.pool_max_idle_per_host.unwrap_or(10),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(Duration::from_secs(90)),
            auth_method: self.auth_method.unwrap_or_default(),
        })
    }
}

/// Settings for the HTTP server binary.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// JSON prompt data; the built-in default is used when unset.
    pub prompt_data_path: Option<PathBuf>,
    pub log_format: LogFormat,
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8787)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            prompt_data_path: None,
            log_format: LogFormat::Json,
            log_level: LogLevel::Info,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, GeminiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, GeminiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, "BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(bytes) = parse_var(&lookup, "MAX_BODY_BYTES")? {
            config.max_body_bytes = bytes;
        }
        config.prompt_data_path = lookup("PROMPT_DATA_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        if let Some(format) = parse_var(&lookup, "LOG_FORMAT")? {
            config.log_format = format;
        }
        if let Some(level) = parse_var(&lookup, "LOG_LEVEL")? {
            config.log_level = level;
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigurationError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(&format!("{} has an unparsable value '{}'", key, raw))),
    }
}

fn invalid(message: &str) -> ConfigurationError {
    ConfigurationError::InvalidConfiguration {
        message: message.to_string(),
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
