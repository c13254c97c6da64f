//! Remote image-generation endpoint adapter.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use toonflow_core::{CoreError, GenerationBackend, GenerationRequest, GenerationResponse};

use crate::client::HttpClient;
use crate::error::FetchError;

/// Path of the image-generation operation, relative to the service base.
const GENERATE_IMAGE_PATH: &str = "gemini/generate-image";

/// [`GenerationBackend`] speaking HTTP to the generation service.
pub struct GenerationClient {
    base_url: Url,
    http: HttpClient,
}

impl GenerationClient {
    /// Creates a client for the service at `base_url` with the given
    /// request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        // A base without a trailing slash would swallow its last segment on join.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let http = HttpClient::with_timeout(timeout)?;
        Ok(Self { base_url, http })
    }

    fn endpoint(&self) -> Result<Url, FetchError> {
        self.base_url
            .join(GENERATE_IMAGE_PATH)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    async fn post_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, FetchError> {
        let url = self.endpoint()?;
        debug!(url = %url, prompt_len = request.prompt.len(), "Requesting generation");

        let response = self.http.post_json(url.as_str(), request).await?;
        let body: GenerationResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(format!("malformed body: {e}")))?;

        Ok(body)
    }
}

#[async_trait]
impl GenerationBackend for GenerationClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, CoreError> {
        let response = self.post_generation(request).await.map_err(|e| {
            warn!(error = %e, "Generation request failed");
            CoreError::from(e)
        })?;

        // Transport succeeded but the payload is unusable; same outcome
        // for the caller as any other generation failure.
        response
            .validate()
            .map_err(|e| CoreError::GenerationFailed(e.to_string()))?;

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let client =
            GenerationClient::new("https://api.example/v1", Duration::from_secs(45)).unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "https://api.example/v1/gemini/generate-image"
        );
    }

    #[test]
    fn test_endpoint_join_with_trailing_slash() {
        let client =
            GenerationClient::new("https://api.example/v1/", Duration::from_secs(45)).unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "https://api.example/v1/gemini/generate-image"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(GenerationClient::new("not a url", Duration::from_secs(45)).is_err());
    }
}
