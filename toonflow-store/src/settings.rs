//! User and deployment configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json_or_default, save_json};

// ============================================================================
// Settings
// ============================================================================

/// Deployment configuration for the gating engine and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the generation service.
    pub api_base_url: String,

    /// Optional URL of the entitlement check endpoint. When unset, the
    /// entitlement flag stored in local state is used instead.
    pub entitlement_url: Option<String>,

    /// Timeout for generation requests, in seconds.
    pub request_timeout_secs: u64,

    /// Grace-period duration after a manual paywall dismissal, in minutes.
    pub grace_minutes: u64,

    /// Whether hitting the daily limit mid-flow also routes to the paywall
    /// (as opposed to only surfacing an inline limit-reached message).
    pub paywall_on_limit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            entitlement_url: None,
            request_timeout_secs: 45,
            grace_minutes: 30,
            paywall_on_limit: true,
        }
    }
}

impl Settings {
    /// Loads settings from the default path, falling back to defaults.
    pub async fn load_default() -> Self {
        Self::load(&default_settings_path()).await
    }

    /// Loads settings from `path`, falling back to defaults.
    pub async fn load(path: &Path) -> Self {
        load_json_or_default(path).await
    }

    /// Saves settings to the default path.
    pub async fn save_default(&self) -> Result<(), StoreError> {
        self.save(&default_settings_path()).await
    }

    /// Saves settings to `path`.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self).await?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
