//! HTTP client abstractions.

use crate::error::FetchError;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default request timeout in seconds.
///
/// Image generation is slow; this sits in the middle of the recommended
/// 30-60 second window and is configurable per deployment.
const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// HTTP client with an explicit per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("toonflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: client,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Performs a JSON POST request.
    ///
    /// A non-2xx status or a transport timeout is returned as a typed
    /// error; the response body is not consumed on failure.
    pub async fn post_json<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Response, FetchError> {
        debug!(url = %url, "Making POST request");

        let result = self.inner.post(url).json(body).send().await;

        match result {
            Ok(response) => {
                if response.status().is_success() {
                    Ok(response)
                } else {
                    Err(FetchError::InvalidResponse(format!(
                        "Unexpected status code: {}",
                        response.status()
                    )))
                }
            }
            Err(e) if e.is_timeout() => Err(FetchError::Timeout(self.timeout_secs)),
            Err(e) => Err(e.into()),
        }
    }

    /// Performs a simple GET request.
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let result = self.inner.get(url).send().await;
        match result {
            Ok(response) => Ok(response),
            Err(e) if e.is_timeout() => Err(FetchError::Timeout(self.timeout_secs)),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
