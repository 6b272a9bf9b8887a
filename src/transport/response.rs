//! HTTP response parser for the Gemini API.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use super::http::HttpResponse;
use crate::error::{map_http_status_with_body, GeminiError, ServerError};

/// Turns raw responses into typed bodies or [`GeminiError`]s.
pub struct ResponseParser;

impl ResponseParser {
    /// Deserializes a 2xx body; any other status becomes an error.
    pub fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, GeminiError> {
        if response.is_success() {
            Ok(serde_json::from_slice(&response.body)?)
        } else {
            Err(Self::parse_error_response(response))
        }
    }

    /// Maps an error response, applying the `Retry-After` header to rate
    /// limit and unavailability errors.
    pub fn parse_error_response(response: HttpResponse) -> GeminiError {
        let retry_after = Self::parse_retry_after(&response.headers);
        let error = map_http_status_with_body(response.status, &response.body);

        let error = match error {
            GeminiError::RateLimit(rate_limit) => {
                GeminiError::RateLimit(rate_limit.with_retry_after(retry_after))
            }
            GeminiError::Server(ServerError::ServiceUnavailable { .. }) => {
                GeminiError::Server(ServerError::ServiceUnavailable { retry_after })
            }
            other => other,
        };

        tracing::debug!(
            status = response.status,
            request_id = Self::extract_request_id(&response.headers).as_deref(),
            error = %error,
            "Gemini API returned an error status"
        );

        error
    }

    /// Parses `Retry-After` given in seconds; HTTP dates are ignored.
    ///
    /// ```
    /// use cat_advisor::transport::ResponseParser;
    /// use std::collections::HashMap;
    /// use std::time::Duration;
    ///
    /// let mut headers = HashMap::new();
    /// headers.insert("Retry-After".to_string(), "60".to_string());
    ///
    /// assert_eq!(ResponseParser::parse_retry_after(&headers), Some(Duration::from_secs(60)));
    /// ```
    pub fn parse_retry_after(headers: &HashMap<String, String>) -> Option<Duration> {
        header_value(headers, &["retry-after"])
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Extracts the upstream request ID, if the response carries one.
    pub fn extract_request_id(headers: &HashMap<String, String>) -> Option<String> {
        header_value(headers, &["x-request-id", "x-goog-request-id", "request-id"])
            .map(str::to_string)
    }
}

fn header_value<'a>(headers: &'a HashMap<String, String>, names: &[&str]) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| names.iter().any(|name| key.eq_ignore_ascii_case(name)))
        .map(|(_, value)| value.as_str())
}
