//! Reqwest-based HTTP transport implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use super::error::TransportError;
use super::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::config::GeminiConfig;

/// Reqwest-based HTTP transport (rustls).
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new reqwest transport with the given timeouts.
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        Self::build(Client::builder(), timeout, connect_timeout)
    }

    /// Create a transport honoring the pool settings of `config`.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, TransportError> {
        let builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout);
        Self::build(builder, config.timeout, config.connect_timeout)
    }

    fn build(
        builder: reqwest::ClientBuilder,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = builder
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    fn convert_headers(headers: HashMap<String, String>) -> reqwest::header::HeaderMap {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
                reqwest::header::HeaderValue::from_str(&value),
            ) {
                header_map.insert(name, val);
            }
        }
        header_map
    }

    fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect()
    }

    fn map_send_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            // Strip the URL: with query-param auth it carries the API key.
            TransportError::Connection(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req_builder = self
            .client
            .request(Self::convert_method(request.method), &request.url)
            .headers(Self::convert_headers(request.headers));

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(format!("Failed to read response body: {}", e.without_url())))?;

        Ok(HttpResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_transport_creation() {
        let transport = ReqwestTransport::new(Duration::from_secs(30), Duration::from_secs(10));
        assert!(transport.is_ok());
    }
}
