//! Content generation service for the Gemini API.

mod service;
mod validation;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GeminiError, GeminiResult, ResponseError};

pub use service::{should_retry_model_call, GeminiContentService};
pub use validation::{validate_generate_request, validate_generation_config};

/// Text and schema-constrained generation from a single prompt.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Free-text answer to `prompt`.
    async fn generate_text(&self, prompt: &str) -> GeminiResult<String>;

    /// JSON answer to `prompt`, constrained by the JSON Schema `schema`.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> GeminiResult<Value>;
}

/// Calls [`ContentService::generate_json`] and deserializes the answer into `T`.
pub async fn generate_structured<T, S>(service: &S, prompt: &str, schema: &Value) -> GeminiResult<T>
where
    T: DeserializeOwned,
    S: ContentService + ?Sized,
{
    let value = service.generate_json(prompt, schema).await?;
    serde_json::from_value(value).map_err(|e| {
        GeminiError::Response(ResponseError::DeserializationError {
            message: e.to_string(),
        })
    })
}
