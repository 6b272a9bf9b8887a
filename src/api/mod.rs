//! HTTP surface.
//!
//! | Route                     | Response                                  |
//! |---------------------------|-------------------------------------------|
//! | `GET /`                   | plain-text banner                         |
//! | `GET /health`             | `{"status":"ok"}`                         |
//! | `POST /api/diagnosis`     | `{"diagnosis", "generatedAt"}`            |
//! | `POST /api/recommendation`| `{"summary", "recommendations", "notes", "generatedAt"}` |

pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::DEFAULT_MAX_BODY_BYTES;
use crate::observability::ErrorLogger;
use crate::prompts::PromptData;
use crate::services::ContentService;

pub use error::{ApiError, ApiResult, Operation, REQUEST_ID_HEADER};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<dyn ContentService>,
    pub prompt_data: Arc<PromptData>,
    pub error_logger: ErrorLogger,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(content: Arc<dyn ContentService>, prompt_data: PromptData) -> Self {
        Self {
            content,
            prompt_data: Arc::new(prompt_data),
            error_logger: ErrorLogger::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_error_logger(mut self, error_logger: ErrorLogger) -> Self {
        self.error_logger = error_logger;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("prompt_version", &self.prompt_data.version)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/diagnosis", post(handlers::diagnosis))
        .route("/api/recommendation", post(handlers::recommendation))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
