//! Mock implementations for testing.
//!
//! Test doubles for the transport, the content service, and the logger so the
//! resilience core and the HTTP surface can be exercised without network
//! access.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{GeminiError, GeminiResult};
use crate::observability::Logger;
use crate::services::ContentService;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// A queued transport reply, optionally held back before it is returned.
struct ScriptedResponse {
    result: Result<HttpResponse, TransportError>,
    delay: Option<Duration>,
}

/// Mock HTTP transport for testing.
///
/// Responses are returned in the order they were enqueued; every request is
/// recorded, including those that arrive after the queue ran dry.
///
/// # Example
///
/// ```
/// use cat_advisor::mocks::MockHttpTransport;
/// use cat_advisor::transport::{HttpMethod, HttpRequest, HttpTransport};
/// use std::collections::HashMap;
///
/// # tokio_test::block_on(async {
/// let transport = MockHttpTransport::new();
/// transport.enqueue_json_response(200, r#"{"status": "ok"}"#);
///
/// let request = HttpRequest {
///     method: HttpMethod::Get,
///     url: "https://example.com".to_string(),
///     headers: HashMap::new(),
///     body: None,
/// };
///
/// let response = transport.send(request).await.unwrap();
/// assert_eq!(response.status, 200);
/// transport.verify_request_count(1);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockHttpTransport {
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockHttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a response to be returned by the next request.
    pub fn enqueue_response(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(ScriptedResponse {
            result: response,
            delay: None,
        });
    }

    /// Enqueue a response that is only returned after `delay` has elapsed.
    pub fn enqueue_delayed_response(
        &self,
        response: Result<HttpResponse, TransportError>,
        delay: Duration,
    ) {
        self.responses.lock().unwrap().push_back(ScriptedResponse {
            result: response,
            delay: Some(delay),
        });
    }

    /// Enqueue a JSON response with the given status code and body.
    pub fn enqueue_json_response(&self, status: u16, body: &str) {
        self.enqueue_response(Ok(json_response(status, body, HashMap::new())));
    }

    /// Enqueue a JSON response carrying extra headers, e.g. `retry-after`.
    pub fn enqueue_json_response_with_headers(
        &self,
        status: u16,
        body: &str,
        headers: &[(&str, &str)],
    ) {
        let headers = headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        self.enqueue_response(Ok(json_response(status, body, headers)));
    }

    /// Enqueue a transport failure.
    pub fn enqueue_error(&self, error: TransportError) {
        self.enqueue_response(Err(error));
    }

    /// Get all requests that were made.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Number of requests that were made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Verify that exactly `expected` requests were made.
    pub fn verify_request_count(&self, expected: usize) {
        let actual = self.request_count();
        assert_eq!(actual, expected, "Expected {} requests, got {}", expected, actual);
    }

    /// Verify that a request was made with the expected method and URL.
    pub fn verify_request(&self, index: usize, method: HttpMethod, url_contains: &str) {
        let requests = self.requests.lock().unwrap();
        assert!(index < requests.len(), "No request at index {}", index);

        let request = &requests[index];
        assert_eq!(request.method, method, "Expected method {:?}, got {:?}", method, request.method);
        assert!(
            request.url.contains(url_contains),
            "Expected URL to contain '{}', got '{}'",
            url_contains,
            request.url
        );
    }

    /// Verify that a request contains a specific header.
    pub fn verify_header(&self, index: usize, header_name: &str, header_value: &str) {
        let requests = self.requests.lock().unwrap();
        assert!(index < requests.len(), "No request at index {}", index);

        let actual_value = requests[index].headers.get(header_name);
        assert_eq!(
            actual_value,
            Some(&header_value.to_string()),
            "Expected header '{}' to be '{}', got {:?}",
            header_name,
            header_value,
            actual_value
        );
    }

    /// Parsed JSON body of the request at `index`.
    pub fn request_json(&self, index: usize) -> Value {
        let requests = self.requests.lock().unwrap();
        let body = requests
            .get(index)
            .and_then(|request| request.body.clone())
            .unwrap_or_else(|| panic!("No request body at index {}", index));
        serde_json::from_slice(&body).expect("request body is not JSON")
    }
}

fn json_response(status: u16, body: &str, mut headers: HashMap<String, String>) -> HttpResponse {
    headers.insert("content-type".to_string(), "application/json".to_string());
    HttpResponse {
        status,
        headers,
        body: Bytes::from(body.to_string()),
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(ScriptedResponse { result, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(TransportError::Connection(
                "No response configured in MockHttpTransport".into(),
            )),
        }
    }
}

/// Mock content service returning scripted results and recording prompts.
#[derive(Clone, Default)]
pub struct MockContentService {
    text_results: Arc<Mutex<VecDeque<GeminiResult<String>>>>,
    json_results: Arc<Mutex<VecDeque<GeminiResult<Value>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    schemas: Arc<Mutex<Vec<Value>>>,
}

impl MockContentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_text(&self, result: GeminiResult<String>) {
        self.text_results.lock().unwrap().push_back(result);
    }

    pub fn enqueue_json(&self, result: GeminiResult<Value>) {
        self.json_results.lock().unwrap().push_back(result);
    }

    /// Prompts received so far, text and JSON calls alike.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Schemas received by `generate_json`.
    pub fn schemas(&self) -> Vec<Value> {
        self.schemas.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentService for MockContentService {
    async fn generate_text(&self, prompt: &str) -> GeminiResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.text_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GeminiError::unexpected("No text result configured in MockContentService")))
    }

    async fn generate_json(&self, prompt: &str, schema: &Value) -> GeminiResult<Value> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.schemas.lock().unwrap().push(schema.clone());
        self.json_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GeminiError::unexpected("No JSON result configured in MockContentService")))
    }
}

/// One call captured by [`RecordingLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    pub fields: Value,
}

/// Logger that keeps every call in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries logged at `level`.
    pub fn entries_at(&self, level: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }

    fn record(&self, level: &str, message: &str, fields: Value) {
        self.entries.lock().unwrap().push(LogEntry {
            level: level.to_string(),
            message: message.to_string(),
            fields,
        });
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, message: &str, fields: Value) {
        self.record("debug", message, fields);
    }

    fn info(&self, message: &str, fields: Value) {
        self.record("info", message, fields);
    }

    fn warn(&self, message: &str, fields: Value) {
        self.record("warn", message, fields);
    }

    fn error(&self, message: &str, fields: Value) {
        self.record("error", message, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get_request(url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_mock_transport_multiple_responses() {
        let transport = MockHttpTransport::new();
        transport.enqueue_json_response(200, r#"{"id": 1}"#);
        transport.enqueue_json_response(503, r#"{"id": 2}"#);

        let first = transport.send(get_request("https://example.com/1")).await.unwrap();
        let second = transport.send(get_request("https://example.com/2")).await.unwrap();

        assert_eq!(first.status, 200);
        assert_eq!(second.status, 503);
        transport.verify_request_count(2);
        transport.verify_request(1, HttpMethod::Get, "/2");
    }

    #[tokio::test]
    async fn test_mock_transport_runs_dry() {
        let transport = MockHttpTransport::new();

        let result = transport.send(get_request("https://example.com")).await;

        assert!(matches!(result, Err(TransportError::Connection(_))));
        transport.verify_request_count(1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_transport_delay() {
        let transport = MockHttpTransport::new();
        transport.enqueue_delayed_response(
            Ok(json_response(200, "{}", HashMap::new())),
            Duration::from_secs(5),
        );

        let start = tokio::time::Instant::now();
        transport.send(get_request("https://example.com")).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_mock_content_service_records_prompts() {
        let service = MockContentService::new();
        service.enqueue_json(Ok(json!({"summary": "ok"})));

        let value = service.generate_json("prompt", &json!({"type": "object"})).await.unwrap();
        let missing = service.generate_text("second").await;

        assert_eq!(value["summary"], "ok");
        assert!(missing.is_err());
        assert_eq!(service.prompts(), vec!["prompt".to_string(), "second".to_string()]);
        assert_eq!(service.schemas().len(), 1);
    }

    #[test]
    fn test_recording_logger() {
        let logger = RecordingLogger::new();
        logger.info("started", json!({"a": 1}));
        logger.error("failed", json!({}));

        assert_eq!(logger.entries().len(), 2);
        assert_eq!(logger.entries_at("error")[0].message, "failed");
    }
}
