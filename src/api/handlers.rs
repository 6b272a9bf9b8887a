//! Route handlers.

use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Instant;
use uuid::Uuid;

use super::error::{ApiError, ApiResult, Operation};
use super::AppState;
use crate::domain::{CatInfo, DiagnosisResponse, RecommendationResponse, RecommendationResult};
use crate::error::GeminiError;
use crate::observability::ErrorLogContext;
use crate::prompts::{build_diagnosis_prompt, build_recommendation_prompt, recommendation_schema};
use crate::services::generate_structured;

pub const BANNER: &str = "cat-advisor: POST /api/diagnosis or /api/recommendation";

pub async fn index() -> &'static str {
    BANNER
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Free-text health advice for the submitted cat.
pub async fn diagnosis(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<DiagnosisResponse>> {
    let call = ModelCall::start(Operation::Diagnosis);
    let cat = parse_cat_request(&body)?;

    let prompt = build_diagnosis_prompt(&cat);
    let diagnosis = state
        .content
        .generate_text(&prompt)
        .await
        .map_err(|e| call.fail(&state, &e))?;

    call.finish();
    Ok(Json(DiagnosisResponse {
        diagnosis,
        generated_at: Utc::now(),
    }))
}

/// Up to three catalog products for the submitted cat.
pub async fn recommendation(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<RecommendationResponse>> {
    let call = ModelCall::start(Operation::Recommendation);
    let cat = parse_cat_request(&body)?;

    let prompt = build_recommendation_prompt(&state.prompt_data, &cat);
    let result: RecommendationResult =
        generate_structured(state.content.as_ref(), &prompt, recommendation_schema())
            .await
            .map_err(|e| call.fail(&state, &e))?;

    call.finish();
    Ok(Json(RecommendationResponse {
        result: result.truncated(),
        generated_at: Utc::now(),
    }))
}

/// Request id and clock for one model-backed request.
struct ModelCall {
    operation: Operation,
    request_id: String,
    started: Instant,
}

impl ModelCall {
    fn start(operation: Operation) -> Self {
        Self {
            operation,
            request_id: Uuid::new_v4().to_string(),
            started: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn finish(&self) {
        tracing::info!(
            request_id = %self.request_id,
            operation = self.operation.as_str(),
            duration_ms = self.elapsed_ms(),
            "Request completed"
        );
    }

    /// Logs and classifies `error`, producing the response error.
    fn fail(&self, state: &AppState, error: &GeminiError) -> ApiError {
        let context = ErrorLogContext::new(self.request_id.clone(), self.operation.as_str())
            .with_duration_ms(self.elapsed_ms());
        let details = state.error_logger.log_and_classify(error, &context);

        ApiError::Upstream {
            operation: self.operation,
            request_id: self.request_id.clone(),
            details,
            retry_after: error.retry_after(),
        }
    }
}

/// Parses `{"cat": CatInfo}` and validates the cat.
pub fn parse_cat_request(body: &[u8]) -> ApiResult<CatInfo> {
    let mut request: Value = serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?;

    let cat = match request.get_mut("cat").map(Value::take) {
        None | Some(Value::Null) => return Err(ApiError::MissingCat),
        Some(cat) => cat,
    };

    let cat: CatInfo = serde_json::from_value(cat).map_err(|e| ApiError::InvalidCat(vec![e.to_string()]))?;
    cat.validate().map_err(|e| ApiError::InvalidCat(e.messages))?;

    Ok(cat)
}
