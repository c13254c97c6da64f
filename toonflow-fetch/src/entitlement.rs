//! Entitlement endpoint adapter.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use toonflow_core::{CoreError, EntitlementProvider};

use crate::client::HttpClient;
use crate::error::FetchError;

/// Timeout for entitlement checks. Deliberately short: a slow check must
/// not hold up a user action, and callers fall back to the free tier.
const ENTITLEMENT_TIMEOUT_SECS: u64 = 10;

/// Wire shape of the entitlement check response.
#[derive(Debug, Deserialize)]
struct EntitlementBody {
    entitled: bool,
}

/// [`EntitlementProvider`] speaking HTTP to a subscription backend.
///
/// Any transport or parse failure is returned as an error so the tier
/// resolver fails closed.
pub struct HttpEntitlement {
    url: Url,
    http: HttpClient,
}

impl HttpEntitlement {
    /// Creates an adapter for the check endpoint at `url`.
    pub fn new(url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let http = HttpClient::with_timeout(Duration::from_secs(ENTITLEMENT_TIMEOUT_SECS))?;
        Ok(Self { url, http })
    }
}

#[async_trait]
impl EntitlementProvider for HttpEntitlement {
    async fn is_entitled(&self) -> Result<bool, CoreError> {
        let response = self
            .http
            .get(self.url.as_str())
            .await
            .map_err(|e| CoreError::Entitlement(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::Entitlement(format!(
                "unexpected status code: {}",
                response.status()
            )));
        }

        let body: EntitlementBody = response
            .json()
            .await
            .map_err(|e| CoreError::Entitlement(format!("malformed body: {e}")))?;

        debug!(entitled = body.entitled, "Entitlement check completed");
        Ok(body.entitled)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(HttpEntitlement::new("::: nope").is_err());
    }

    #[test]
    fn test_body_parses() {
        let body: EntitlementBody = serde_json::from_str(r#"{"entitled":true}"#).unwrap();
        assert!(body.entitled);
    }
}
