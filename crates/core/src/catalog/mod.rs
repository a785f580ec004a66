//! Release catalog lookups.
//!
//! [`ReleaseCatalog`] is the seam the lookup pipeline talks to; [`YtsClient`]
//! is the HTTP implementation backed by the YTS JSON API.

mod types;
mod yts;

pub use types::*;
pub use yts::YtsClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when querying a release catalog.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// Request did not complete within the client timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Could not connect, or the connection dropped mid-request.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Server-side failure (HTTP 5xx).
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// API rejected the request.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Any other HTTP client failure.
    #[error("HTTP request failed: {0}")]
    HttpError(String),
}

impl CatalogError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::Timeout(_)
                | CatalogError::ConnectionFailed(_)
                | CatalogError::RateLimitExceeded
                | CatalogError::ServerError { .. }
        )
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout(e.to_string())
        } else if e.is_connect() || e.is_request() || e.is_body() {
            CatalogError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            CatalogError::ParseError(e.to_string())
        } else {
            CatalogError::HttpError(e.to_string())
        }
    }
}

/// A searchable catalog of movie releases.
#[async_trait]
pub trait ReleaseCatalog: Send + Sync {
    /// Catalog name, for logs.
    fn name(&self) -> &str;

    /// Search for movies matching a query. An empty list is a valid answer.
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogMovie>, CatalogError>;
}
