//! Integration tests for the Gemini content service.

use cat_advisor::config::{GeminiConfig, RetryConfig};
use cat_advisor::domain::RecommendationResult;
use cat_advisor::error::{classify, ContentError, ErrorType, GeminiError, ResponseError};
use cat_advisor::fixtures::load_fixture;
use cat_advisor::mocks::{MockHttpTransport, RecordingLogger};
use cat_advisor::prompts::recommendation_schema;
use cat_advisor::services::{generate_structured, ContentService, GeminiContentService};
use cat_advisor::transport::{HttpMethod, HttpResponse, TransportError};
use secrecy::SecretString;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn test_config() -> GeminiConfig {
    GeminiConfig::builder()
        .api_key(SecretString::new("test-key".into()))
        .retry_config(RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        })
        .attempt_timeout_ms(1_000)
        .build()
        .unwrap()
}

/// Helper to create a test content service with mock transport.
fn create_test_service(transport: Arc<MockHttpTransport>) -> GeminiContentService {
    GeminiContentService::new(&test_config(), transport)
}

#[tokio::test]
async fn test_generate_text_success() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &load_fixture("content/success_response.json"));
    let service = create_test_service(transport.clone());

    // Act
    let text = service.generate_text("猫の健康について教えて").await;

    // Assert
    assert!(text.unwrap().starts_with("みーちゃんちゃんは全体的に健康的"));
    transport.verify_request_count(1);
    transport.verify_request(0, HttpMethod::Post, "/v1beta/models/gemini-2.5-flash:generateContent");
    transport.verify_header(0, "x-goog-api-key", "test-key");

    let body = transport.request_json(0);
    assert_eq!(body["contents"][0]["parts"][0]["text"], "猫の健康について教えて");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    assert!(body["generationConfig"].get("responseMimeType").is_none());
}

#[tokio::test]
async fn test_generate_json_sends_schema() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &load_fixture("content/recommendation_response.json"));
    let service = create_test_service(transport.clone());

    // Act
    let result: RecommendationResult =
        generate_structured(&service, "おすすめは？", recommendation_schema())
            .await
            .unwrap();

    // Assert
    assert_eq!(result.recommendations.len(), 1);
    assert_eq!(result.recommendations[0].name, "ライトサーモン");

    let body = transport.request_json(0);
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["responseJsonSchema"], *recommendation_schema());
}

#[tokio::test(start_paused = true)]
async fn test_empty_response_is_retried() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &load_fixture("content/empty_response.json"));
    transport.enqueue_json_response(200, &load_fixture("content/success_response.json"));
    let service = create_test_service(transport.clone());

    // Act
    let result = service.generate_text("prompt").await;

    // Assert
    assert!(result.is_ok());
    transport.verify_request_count(2);
}

#[tokio::test(start_paused = true)]
async fn test_empty_responses_exhaust_retries() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    for _ in 0..3 {
        transport.enqueue_json_response(200, &load_fixture("content/empty_response.json"));
    }
    let service = create_test_service(transport.clone());

    // Act
    let error = service.generate_text("prompt").await.unwrap_err();

    // Assert
    transport.verify_request_count(3);
    let details = classify(&error);
    assert_eq!(details.error_type, ErrorType::EmptyResponseError);
    assert_eq!(details.status_code, Some(503));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_exhaustion_keeps_retry_after() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    for _ in 0..3 {
        transport.enqueue_json_response_with_headers(
            429,
            &load_fixture("errors/rate_limit.json"),
            &[("retry-after", "30")],
        );
    }
    let service = create_test_service(transport.clone());

    // Act
    let error = service.generate_text("prompt").await.unwrap_err();

    // Assert
    transport.verify_request_count(3);
    assert!(matches!(error, GeminiError::Retry(_)));
    assert_eq!(error.retry_after(), Some(Duration::from_secs(30)));

    let details = classify(&error);
    assert_eq!(details.error_type, ErrorType::RateLimitError);
    assert_eq!(details.status_code, Some(429));
}

#[tokio::test]
async fn test_invalid_api_key_is_not_retried() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(400, &load_fixture("errors/invalid_api_key.json"));
    let service = create_test_service(transport.clone());

    // Act
    let error = service.generate_text("prompt").await.unwrap_err();

    // Assert
    transport.verify_request_count(1);
    let details = classify(&error);
    assert_eq!(details.error_type, ErrorType::AuthenticationError);
    assert!(!details.is_retryable);
}

#[tokio::test(start_paused = true)]
async fn test_slow_attempt_times_out_and_is_retried() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let success = HttpResponse {
        status: 200,
        headers: HashMap::new(),
        body: load_fixture("content/success_response.json").into(),
    };
    transport.enqueue_delayed_response(Ok(success.clone()), Duration::from_secs(5));
    transport.enqueue_response(Ok(success));
    let service = create_test_service(transport.clone());

    // Act
    let result = service.generate_text("prompt").await;

    // Assert
    assert!(result.is_ok());
    transport.verify_request_count(2);
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_timing_out() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    for _ in 0..3 {
        transport.enqueue_delayed_response(
            Err(TransportError::Connection("never reached".into())),
            Duration::from_secs(60),
        );
    }
    let service = create_test_service(transport.clone());

    // Act
    let error = service.generate_text("prompt").await.unwrap_err();

    // Assert
    let details = classify(&error);
    assert_eq!(details.error_type, ErrorType::TimeoutError);
    assert_eq!(details.status_code, Some(504));
    transport.verify_request_count(3);
}

#[tokio::test]
async fn test_safety_block_is_not_retried() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &load_fixture("content/safety_blocked_response.json"));
    let service = create_test_service(transport.clone());

    // Act
    let error = service.generate_text("prompt").await.unwrap_err();

    // Assert
    assert!(matches!(
        error,
        GeminiError::Content(ContentError::SafetyBlocked { .. })
    ));
    transport.verify_request_count(1);
}

#[tokio::test]
async fn test_invalid_json_text_is_a_parse_error() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let body = json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": "not json at all"}]}}]
    });
    transport.enqueue_json_response(200, &body.to_string());
    let service = create_test_service(transport.clone());

    // Act
    let error = service
        .generate_json("prompt", &json!({"type": "object"}))
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(
        error,
        GeminiError::Response(ResponseError::DeserializationError { .. })
    ));
    assert_eq!(classify(&error).error_type, ErrorType::ParseError);
    transport.verify_request_count(1);
}

#[tokio::test]
async fn test_blank_prompt_is_rejected_locally() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    let service = create_test_service(transport.clone());

    // Act
    let error = service.generate_text("   ").await.unwrap_err();

    // Assert
    assert_eq!(classify(&error).error_type, ErrorType::ValidationError);
    transport.verify_request_count(0);
}

#[tokio::test(start_paused = true)]
async fn test_completion_and_failure_are_logged() {
    // Arrange
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_json_response(200, &load_fixture("content/success_response.json"));
    transport.enqueue_json_response(400, &load_fixture("errors/invalid_api_key.json"));
    let logger = Arc::new(RecordingLogger::new());
    let service = create_test_service(transport).with_logger(logger.clone());

    // Act
    service.generate_text("first").await.unwrap();
    service.generate_text("second").await.unwrap_err();

    // Assert
    assert_eq!(logger.entries_at("info")[0].message, "Content generation completed");
    let failures = logger.entries_at("warn");
    assert_eq!(failures.len(), 1);
    assert!(failures[0].fields["error"]
        .as_str()
        .unwrap()
        .contains("API key not valid"));
}

#[tokio::test]
async fn test_reqwest_transport_end_to_end() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(load_fixture("content/success_response.json"))
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = GeminiConfig::builder()
        .api_key(SecretString::new("test-key".into()))
        .base_url(&server.uri())
        .unwrap()
        .build()
        .unwrap();
    let service = GeminiContentService::from_config(&config).unwrap();

    // Act
    let text = service.generate_text("prompt").await.unwrap();

    // Assert
    assert!(text.contains("健康的"));
}

#[tokio::test]
async fn test_reqwest_transport_retries_server_errors() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_string(load_fixture("errors/unavailable.json")),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(load_fixture("content/success_response.json")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = GeminiConfig::builder()
        .api_key(SecretString::new("test-key".into()))
        .base_url(&server.uri())
        .unwrap()
        .retry_config(RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
        })
        .build()
        .unwrap();
    let service = GeminiContentService::from_config(&config).unwrap();

    // Act
    let result = service.generate_text("prompt").await;

    // Assert
    assert!(result.is_ok());
}
