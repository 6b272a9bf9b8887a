//! # cat-advisor
//!
//! HTTP service that turns a cat profile into Gemini-generated health advice
//! and product recommendations.
//!
//! ## Features
//!
//! - Per-attempt deadlines and capped exponential-backoff retries around
//!   every model call, generic over the caller's error type
//! - Classification of failures into stable categories with a recommended
//!   HTTP status, logged as one structured record per failure
//! - Schema-constrained JSON output for recommendations
//! - Secure credential handling with `SecretString`
//! - Mock transport, content service and logger for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cat_advisor::api::{router, AppState};
//! use cat_advisor::prompts::PromptData;
//! use cat_advisor::services::GeminiContentService;
//! use cat_advisor::GeminiConfig;
//! use secrecy::SecretString;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = GeminiConfig::builder()
//!         .api_key(SecretString::new("your-api-key".into()))
//!         .build()?;
//!
//!     let service = GeminiContentService::from_config(&config)?;
//!     let app = router(AppState::new(Arc::new(service), PromptData::builtin()));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8787").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `api` - axum router, handlers and error responses
//! - `config` - Gemini and server configuration
//! - `domain` - cat profile and recommendation types
//! - `error` - error taxonomy, HTTP status mapping, classification
//! - `observability` - logging setup and structured error records
//! - `prompts` - prompt builders and prompt data loading
//! - `resilience` - timeout guard and retry policy
//! - `services` - content generation over the Gemini API
//! - `transport` - HTTP transport layer
//! - `types` - Gemini request/response types

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod observability;
pub mod prompts;
pub mod resilience;
pub mod services;
pub mod transport;
pub mod types;

// Development/testing modules - always available for integration tests
pub mod fixtures;
pub mod mocks;

pub use config::{AuthMethod, GeminiConfig, GeminiConfigBuilder, RetryConfig, ServerConfig};
pub use domain::{CatInfo, RecommendationResult, RecommendedProduct};
pub use error::{classify, ErrorType, GeminiError, GeminiErrorDetails, GeminiResult};
pub use resilience::{
    with_retry, with_timeout, with_timeout_detached, RetryError, RetryOptions, TimeoutError,
};
pub use services::{ContentService, GeminiContentService};
