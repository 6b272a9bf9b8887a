//! Gemini-backed content service with per-attempt deadlines and retries.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use super::validation::validate_generate_request;
use super::ContentService;
use crate::config::GeminiConfig;
use crate::error::{ContentError, GeminiError, GeminiResult, ResponseError};
use crate::observability::{Logger, StructuredLogger};
use crate::resilience::{default_should_retry, with_retry, with_timeout_detached, RetryOptions};
use crate::transport::{
    endpoints, HttpMethod, HttpRequest, HttpTransport, ReqwestTransport, RequestBuilder,
    ResponseParser,
};
use crate::types::{
    BlockReason, FinishReason, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

/// Retry condition used for model calls: the default predicate, plus the
/// deadline variant and empty responses.
///
/// "Operation timed out" does not contain the `timeout` marker, so the typed
/// check is needed for deadlines to be retried.
pub fn should_retry_model_call(error: &GeminiError) -> bool {
    matches!(
        error,
        GeminiError::Timeout(_) | GeminiError::Response(ResponseError::EmptyResponse)
    ) || default_should_retry(error)
}

/// [`ContentService`] calling the Gemini `generateContent` endpoint.
///
/// Each attempt runs under a deadline on its own task; an attempt that
/// misses the deadline is left to finish in the background and its result is
/// discarded. Attempts are repeated according to the retry options.
pub struct GeminiContentService {
    transport: Arc<dyn HttpTransport>,
    request_builder: RequestBuilder,
    model: String,
    generation_defaults: GenerationConfig,
    attempt_timeout_ms: u64,
    retry_options: RetryOptions<GeminiError>,
    logger: Arc<dyn Logger>,
}

impl GeminiContentService {
    /// Create a service over an explicit transport.
    pub fn new(config: &GeminiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            request_builder: RequestBuilder::from_config(config),
            model: config.model.clone(),
            generation_defaults: GenerationConfig {
                temperature: Some(config.temperature),
                max_output_tokens: Some(config.max_output_tokens),
                ..Default::default()
            },
            attempt_timeout_ms: config.attempt_timeout_ms,
            retry_options: config.retry_options().with_should_retry(should_retry_model_call),
            logger: Arc::new(StructuredLogger::new("cat_advisor.gemini")),
        }
    }

    /// Create a service backed by the reqwest transport.
    pub fn from_config(config: &GeminiConfig) -> GeminiResult<Self> {
        let transport = ReqwestTransport::from_config(config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Replace the retry options. The predicate is kept as given.
    pub fn with_retry_options(mut self, options: RetryOptions<GeminiError>) -> Self {
        self.retry_options = options;
        self
    }

    pub fn with_attempt_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.attempt_timeout_ms = timeout_ms;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `request` with retries and returns the raw response.
    pub async fn generate(&self, request: GenerateContentRequest) -> GeminiResult<GenerateContentResponse> {
        self.execute(request, Ok).await
    }

    /// Builds the request for `prompt` on top of the configured defaults.
    fn prompt_request(&self, prompt: &str, schema: Option<&Value>) -> GenerateContentRequest {
        let mut generation_config = self.generation_defaults.clone();
        if let Some(schema) = schema {
            generation_config.response_mime_type = Some("application/json".to_string());
            generation_config.response_json_schema = Some(schema.clone());
        }
        GenerateContentRequest::from_prompt(prompt, generation_config)
    }

    /// Runs the retry loop; `extract` is applied inside every attempt so its
    /// failures take part in retrying.
    async fn execute<T, F>(&self, request: GenerateContentRequest, extract: F) -> GeminiResult<T>
    where
        T: Send + 'static,
        F: Fn(GenerateContentResponse) -> GeminiResult<T> + Clone + Send + Sync + 'static,
    {
        validate_generate_request(&request)?;

        let path = endpoints::generate_content(&self.model);
        let http_request = self
            .request_builder
            .build_request(HttpMethod::Post, &path, Some(&request))?;

        self.logger.debug(
            "Starting content generation",
            json!({
                "model": self.model,
                "timeout_ms": self.attempt_timeout_ms,
                "max_attempts": self.retry_options.effective_max_attempts(),
                "structured": request
                    .generation_config
                    .as_ref()
                    .map(|c| c.response_json_schema.is_some())
                    .unwrap_or(false),
            }),
        );

        let start = Instant::now();
        let result = with_retry(
            || {
                let attempt = send_attempt(
                    Arc::clone(&self.transport),
                    http_request.clone(),
                    extract.clone(),
                );
                with_timeout_detached(attempt, self.attempt_timeout_ms, None)
            },
            &self.retry_options,
        )
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => self.logger.info(
                "Content generation completed",
                json!({ "model": self.model, "duration_ms": duration_ms }),
            ),
            Err(error) => self.logger.warn(
                "Content generation failed",
                json!({
                    "model": self.model,
                    "duration_ms": duration_ms,
                    "error": error.to_string(),
                }),
            ),
        }

        result
    }
}

impl std::fmt::Debug for GeminiContentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiContentService")
            .field("model", &self.model)
            .field("attempt_timeout_ms", &self.attempt_timeout_ms)
            .field("retry_options", &self.retry_options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ContentService for GeminiContentService {
    async fn generate_text(&self, prompt: &str) -> GeminiResult<String> {
        let request = self.prompt_request(prompt, None);
        self.execute(request, extract_text).await
    }

    async fn generate_json(&self, prompt: &str, schema: &Value) -> GeminiResult<Value> {
        let request = self.prompt_request(prompt, Some(schema));
        self.execute(request, |response| {
            let text = extract_text(response)?;
            serde_json::from_str(&text).map_err(|e| {
                GeminiError::Response(ResponseError::DeserializationError {
                    message: e.to_string(),
                })
            })
        })
        .await
    }
}

/// One attempt: send, map the status, reject blocked output, then extract.
async fn send_attempt<T, F>(
    transport: Arc<dyn HttpTransport>,
    request: HttpRequest,
    extract: F,
) -> GeminiResult<T>
where
    F: Fn(GenerateContentResponse) -> GeminiResult<T>,
{
    let response = transport.send(request).await?;
    let response: GenerateContentResponse = ResponseParser::parse_response(response)?;

    check_blocked(&response)?;

    if let Some(usage) = &response.usage_metadata {
        tracing::debug!(
            prompt_tokens = usage.prompt_token_count,
            completion_tokens = usage.candidates_token_count.unwrap_or(0),
            total_tokens = usage.total_token_count,
            "Content generation usage"
        );
    }

    extract(response)
}

/// Answer text of the first candidate; blank text counts as empty.
fn extract_text(response: GenerateContentResponse) -> GeminiResult<String> {
    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ResponseError::EmptyResponse.into()),
    }
}

/// Turns prompt blocks and safety/recitation stops into errors.
fn check_blocked(response: &GenerateContentResponse) -> GeminiResult<()> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_ref())
    {
        if *reason != BlockReason::BlockReasonUnspecified {
            tracing::warn!(block_reason = ?reason, "Prompt blocked by Gemini");
            return Err(ContentError::SafetyBlocked {
                reason: format!("prompt {:?}", reason),
            }
            .into());
        }
    }

    match response.first_candidate().and_then(|c| c.finish_reason.as_ref()) {
        Some(reason @ (FinishReason::Safety | FinishReason::ProhibitedContent | FinishReason::Blocklist | FinishReason::Spii)) => {
            tracing::warn!(finish_reason = ?reason, "Candidate blocked by Gemini");
            Err(ContentError::SafetyBlocked {
                reason: format!("candidate {:?}", reason),
            }
            .into())
        }
        Some(FinishReason::Recitation) => Err(ContentError::RecitationBlocked.into()),
        _ => Ok(()),
    }
}
