//! HTTP error responses.
//!
//! Bodies always have the shape `{"error", "message", "details"?}`; the
//! front-end shows `message (details)`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

use crate::error::{ErrorType, GeminiErrorDetails};

/// Header carrying the per-request id on failed model calls.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Endpoint a failure happened in; also the `operation` of its error record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Diagnosis,
    Recommendation,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Diagnosis => "diagnosis",
            Operation::Recommendation => "recommendation",
        }
    }

    /// Generic message for failures whose cause is not shown to users.
    fn failure_message(&self) -> &'static str {
        match self {
            Operation::Diagnosis => "診断の処理中にエラーが発生しました",
            Operation::Recommendation => "商品提案の処理中にエラーが発生しました",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("猫の情報が必要です")]
    MissingCat,

    /// The cat did not match the expected shape or carried invalid values.
    #[error("Invalid cat information: {}", .0.join("; "))]
    InvalidCat(Vec<String>),

    /// A model call failed; `details` is its classification.
    #[error("{operation:?} failed: {}", .details.error_message)]
    Upstream {
        operation: Operation,
        request_id: String,
        details: GeminiErrorDetails,
        retry_after: Option<Duration>,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Status code sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson | ApiError::MissingCat | ApiError::InvalidCat(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Upstream { details, .. } => upstream_status(details),
        }
    }
}

/// Status for a classified model failure.
fn upstream_status(details: &GeminiErrorDetails) -> StatusCode {
    match details.error_type {
        ErrorType::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
        ErrorType::RateLimitError => StatusCode::TOO_MANY_REQUESTS,
        ErrorType::AuthenticationError | ErrorType::ParseError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::ValidationError => StatusCode::BAD_REQUEST,
        _ => details
            .status_code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

fn upstream_message(operation: Operation, error_type: ErrorType) -> &'static str {
    match error_type {
        ErrorType::TimeoutError => "AIの応答がタイムアウトしました。しばらくしてから再度お試しください",
        ErrorType::RateLimitError => "リクエストが混み合っています。しばらくしてから再度お試しください",
        ErrorType::ValidationError => "AIへのリクエスト内容が不正です",
        _ => operation.failure_message(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let label = status.canonical_reason().unwrap_or("Error");

        let body = match &self {
            ApiError::InvalidJson | ApiError::MissingCat => json!({
                "error": label,
                "message": self.to_string(),
            }),
            ApiError::InvalidCat(messages) => json!({
                "error": label,
                "message": "猫の情報が正しくありません",
                "details": messages.join("; "),
            }),
            ApiError::Upstream { operation, details, .. } => json!({
                "error": label,
                "message": upstream_message(*operation, details.error_type),
                "details": details.error_type.as_str(),
            }),
        };

        let mut response = (status, Json(body)).into_response();

        if let ApiError::Upstream {
            request_id,
            retry_after,
            ..
        } = &self
        {
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(request_id) {
                headers.insert(REQUEST_ID_HEADER, value);
            }
            if let Some(retry_after) = retry_after {
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after.as_secs()));
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(error_type: ErrorType, status_code: Option<u16>) -> ApiError {
        ApiError::Upstream {
            operation: Operation::Diagnosis,
            request_id: "req-1".to_string(),
            details: GeminiErrorDetails {
                error_type,
                error_message: "boom".to_string(),
                is_retryable: false,
                status_code,
            },
            retry_after: None,
        }
    }

    #[test]
    fn test_upstream_status_mapping() {
        assert_eq!(upstream(ErrorType::TimeoutError, Some(504)).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(upstream(ErrorType::RateLimitError, Some(429)).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            upstream(ErrorType::AuthenticationError, Some(401)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(upstream(ErrorType::ValidationError, Some(400)).status(), StatusCode::BAD_REQUEST);
        assert_eq!(upstream(ErrorType::ParseError, Some(500)).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream(ErrorType::NetworkError, Some(503)).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(upstream(ErrorType::UnknownError, None).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_headers() {
        let mut error = upstream(ErrorType::RateLimitError, Some(429));
        if let ApiError::Upstream { retry_after, .. } = &mut error {
            *retry_after = Some(Duration::from_secs(30));
        }

        let response = error.into_response();

        assert_eq!(response.headers()[header::RETRY_AFTER], "30");
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-1");
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(ApiError::MissingCat.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCat(vec!["x".into()]).status(), StatusCode::BAD_REQUEST);
    }
}
