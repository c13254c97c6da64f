//! Fetch error types.

use thiserror::Error;
use toonflow_core::CoreError;

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Invalid response from the endpoint.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL configuration.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<FetchError> for CoreError {
    fn from(err: FetchError) -> Self {
        CoreError::GenerationFailed(err.to_string())
    }
}
