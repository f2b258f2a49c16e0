//! Common utilities for MAAS API client
//!
//! Provides shared functionality used across all API modules: API key
//! handling, OAuth request signing and the request/response plumbing.

pub mod query;

use crate::error::MaasError;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

/// MAAS API key (`consumer_key:token_key:token_secret`)
#[derive(Clone)]
pub struct ApiKey {
    consumer_key: String,
    token_key: String,
    token_secret: String,
}

impl ApiKey {
    /// Parse an API key as shown in the MAAS UI
    pub fn parse(raw: &str) -> Result<Self, MaasError> {
        let mut parts = raw.trim().split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(consumer), Some(token), Some(secret), None)
                if !consumer.is_empty() && !token.is_empty() && !secret.is_empty() =>
            {
                Ok(Self {
                    consumer_key: consumer.to_string(),
                    token_key: token.to_string(),
                    token_secret: secret.to_string(),
                })
            }
            _ => Err(MaasError::InvalidApiKey),
        }
    }

    /// OAuth 1.0 PLAINTEXT authorization header value
    ///
    /// MAAS uses an empty consumer secret, so the signature is `&<token_secret>`.
    pub fn authorization(&self, nonce: &str, timestamp: i64) -> String {
        format!(
            "OAuth realm=\"\", oauth_version=\"1.0\", oauth_signature_method=\"PLAINTEXT\", \
             oauth_consumer_key=\"{}\", oauth_token=\"{}\", oauth_signature=\"&{}\", \
             oauth_nonce=\"{}\", oauth_timestamp=\"{}\"",
            self.consumer_key,
            self.token_key,
            urlencoding::encode(&self.token_secret),
            nonce,
            timestamp,
        )
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &"<redacted>")
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// HTTP client wrapper with authentication
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: ApiKey,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Get authorization header value (fresh nonce and timestamp per request)
    pub fn auth_header(&self) -> String {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        self.api_key.authorization(&nonce, chrono::Utc::now().timestamp())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
    }

    /// Map a non-success response to the matching error
    async fn check(method: &str, path: &str, response: Response) -> Result<Response, MaasError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(MaasError::Authentication(format!(
                "{} {} rejected: {} - {}",
                method, path, status, body
            ))),
            404 => Err(MaasError::NotFound(format!(
                "Resource not found: {} - {}",
                path, body
            ))),
            400 => Err(MaasError::InvalidRequest(format!(
                "{} {} failed: {} - {}",
                method, path, status, body
            ))),
            _ => Err(MaasError::Api(format!(
                "{} {} failed: {} - {}",
                method, path, status, body
            ))),
        }
    }

    /// Decode a JSON body, keeping the start of the body for the error message
    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, MaasError> {
        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            MaasError::Api(format!(
                "error decoding response body: {} - Response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            ))
        })
    }

    /// Make a GET request
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, MaasError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(MaasError::Http)?;

        let response = Self::check("GET", path, response).await?;
        Self::decode(response).await
    }

    /// Make a form-encoded POST request and decode the JSON response
    pub async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, MaasError> {
        let response = self.send_form("POST", path, form).await?;
        Self::decode(response).await
    }

    /// Make a form-encoded POST request whose response body is not JSON
    pub async fn post_unit(&self, path: &str, form: &[(&str, String)]) -> Result<(), MaasError> {
        self.send_form("POST", path, form).await?;
        Ok(())
    }

    /// Make a form-encoded PUT request
    pub async fn put<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, MaasError> {
        let response = self.send_form("PUT", path, form).await?;
        Self::decode(response).await
    }

    async fn send_form(
        &self,
        method: &str,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Response, MaasError> {
        let url = self.build_url(path);
        debug!("{} {} with form: {:?}", method, url, form);

        let builder = match method {
            "PUT" => self.client.put(&url),
            _ => self.client.post(&url),
        };
        let response = self
            .authorized(builder)
            .form(form)
            .send()
            .await
            .map_err(MaasError::Http)?;

        Self::check(method, path, response).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), MaasError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .await
            .map_err(MaasError::Http)?;

        Self::check("DELETE", path, response).await?;
        Ok(())
    }
}
