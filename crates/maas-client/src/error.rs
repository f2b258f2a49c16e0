//! MAAS client errors

use thiserror::Error;

/// Errors that can occur when interacting with the MAAS API
#[derive(Debug, Error)]
pub enum MaasError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// MAAS API returned an error
    #[error("MAAS API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (invalid or revoked API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// API key is not in `consumer:token:secret` form
    #[error("Invalid API key: expected 'consumer_key:token_key:token_secret'")]
    InvalidApiKey,
}

impl MaasError {
    /// Whether the error is a 404 from the backend
    pub fn is_not_found(&self) -> bool {
        matches!(self, MaasError::NotFound(_))
    }
}
