//! Error mapping utilities for HTTP status codes and API responses.

use serde::Deserialize;

use super::categories::*;
use super::types::GeminiError;

/// Structured API error response from Gemini.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Detailed error information from the API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub details: Vec<serde_json::Value>,
}

/// Maps an HTTP status code and response body to a [`GeminiError`].
///
/// The body is parsed as the `{"error": {...}}` envelope Gemini returns;
/// anything else is used verbatim as the message.
pub fn map_http_status_with_body(status: u16, body: &[u8]) -> GeminiError {
    let (message, error_details) = match serde_json::from_slice::<ApiErrorResponse>(body) {
        Ok(response) => (response.error.message.clone(), Some(response.error)),
        Err(_) => (String::from_utf8_lossy(body).trim().to_string(), None),
    };
    let lowered = message.to_lowercase();

    match status {
        400 => {
            let details = error_details
                .as_ref()
                .map(|e| parse_validation_details(&e.details))
                .unwrap_or_default();

            GeminiError::Request(RequestError::ValidationError { message, details })
        }

        401 => GeminiError::Authentication(AuthenticationError::InvalidApiKey),

        403 => {
            if lowered.contains("quota") {
                GeminiError::RateLimit(RateLimitError::QuotaExceeded { retry_after: None })
            } else {
                GeminiError::Authentication(AuthenticationError::PermissionDenied { message })
            }
        }

        404 => GeminiError::Request(RequestError::ModelNotFound {
            model: extract_resource_name(&message),
        }),

        // Retry-After is applied afterwards by the response parser.
        429 => {
            if lowered.contains("quota") {
                GeminiError::RateLimit(RateLimitError::QuotaExceeded { retry_after: None })
            } else {
                GeminiError::RateLimit(RateLimitError::TooManyRequests { retry_after: None })
            }
        }

        503 => {
            if lowered.contains("overload") {
                GeminiError::Server(ServerError::ModelOverloaded {
                    model: extract_resource_name(&message),
                })
            } else {
                GeminiError::Server(ServerError::ServiceUnavailable { retry_after: None })
            }
        }

        500..=599 => GeminiError::Server(ServerError::InternalError { status, message }),

        _ => GeminiError::unexpected(format!("HTTP {}: {}", status, message)),
    }
}

/// Extracts a model or resource name from an error message.
fn extract_resource_name(message: &str) -> String {
    if let Some(found) = message
        .split_whitespace()
        .find(|s| s.starts_with("models/"))
    {
        return found
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '-' && c != '_' && c != '.')
            .to_string();
    }

    for quote in ['\'', '"'] {
        if let Some(start) = message.find(quote) {
            if let Some(end) = message[start + 1..].find(quote) {
                return message[start + 1..start + 1 + end].to_string();
            }
        }
    }

    "unknown".to_string()
}

/// Parses validation details from the error response `details` array.
fn parse_validation_details(details: &[serde_json::Value]) -> Vec<ValidationDetail> {
    let mut result = Vec::new();

    for detail in details {
        // Field violations are nested under `fieldViolations` in BadRequest details.
        let candidates = detail
            .get("fieldViolations")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_else(|| vec![detail.clone()]);

        for candidate in &candidates {
            let Some(obj) = candidate.as_object() else {
                continue;
            };

            let field = obj
                .get("field")
                .or_else(|| obj.get("fieldPath"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");

            let description = obj
                .get("description")
                .or_else(|| obj.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("");

            if !description.is_empty() {
                result.push(ValidationDetail {
                    field: field.to_string(),
                    description: description.to_string(),
                });
            }
        }
    }

    result
}
