//! HTTP request builder for the Gemini API.

use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

use super::http::{HttpMethod, HttpRequest};
use crate::config::{AuthMethod, GeminiConfig};
use crate::error::GeminiError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Builds authenticated requests against `{base_url}/{api_version}/...`.
///
/// The API key goes either into the `x-goog-api-key` header or into the
/// `key` query parameter, depending on [`AuthMethod`].
#[derive(Clone)]
pub struct RequestBuilder {
    base_url: Url,
    api_version: String,
    api_key: SecretString,
    auth_method: AuthMethod,
}

impl RequestBuilder {
    pub fn new(base_url: Url, api_version: String, api_key: SecretString, auth_method: AuthMethod) -> Self {
        Self {
            base_url,
            api_version,
            api_key,
            auth_method,
        }
    }

    pub fn from_config(config: &GeminiConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.api_version.clone(),
            config.api_key.clone(),
            config.auth_method,
        )
    }

    /// Builds the full URL for `path`, prefixed with the API version.
    pub fn build_url(&self, path: &str) -> Result<Url, GeminiError> {
        let path = path.trim_start_matches('/');
        let full_path = format!("{}/{}", self.api_version.trim_matches('/'), path);

        // Joining replaces the last segment unless the base ends with '/'.
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }

        let mut url = base.join(&full_path)?;

        if self.auth_method == AuthMethod::QueryParam {
            url.query_pairs_mut()
                .append_pair("key", self.api_key.expose_secret());
        }

        Ok(url)
    }

    /// Builds a request with an optional JSON body.
    pub fn build_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&T>,
    ) -> Result<HttpRequest, GeminiError> {
        let url = self.build_url(path)?;

        let mut headers = HashMap::new();
        if body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if self.auth_method == AuthMethod::Header {
            headers.insert(
                API_KEY_HEADER.to_string(),
                self.api_key.expose_secret().to_string(),
            );
        }

        let body = match body {
            Some(body) => Some(Bytes::from(serde_json::to_vec(body)?)),
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("auth_method", &self.auth_method)
            .finish_non_exhaustive()
    }
}
