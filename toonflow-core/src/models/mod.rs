//! Domain models for `ToonFlow`.
//!
//! This module contains the core domain types:
//! - [`SubscriptionTier`], [`UsageRecord`], [`UsageReport`] - quota tracking
//! - [`Session`] - identity snapshot from the auth collaborator
//! - [`StyleEntry`] - static style catalog entries
//! - [`GenerationRequest`], [`GenerationResponse`], [`GeneratedImage`] -
//!   generation endpoint wire shapes

use serde::{Deserialize, Serialize};

mod generation;
mod style;
mod tier;
mod usage;

pub use generation::{GeneratedImage, GenerationRequest, GenerationResponse};
pub use style::StyleEntry;
pub use tier::{SubscriptionTier, FREE_DAILY_LIMIT, PRO_DAILY_LIMIT};
pub use usage::{UsageRecord, UsageReport};

// ============================================================================
// Session
// ============================================================================

/// Snapshot of the current auth session.
///
/// Produced by the identity collaborator; consumed by the usage ledger when
/// emitting the server-side usage log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Stable identifier for the user (may be an anonymous identity).
    pub user_id: String,
    /// True when the identity was created anonymously.
    pub is_anonymous: bool,
}

impl Session {
    /// Creates an anonymous session with the given identifier.
    pub fn anonymous(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_anonymous: true,
        }
    }
}

// ============================================================================
// Telemetry
// ============================================================================

/// Severity level for error-tracking messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Informational message.
    #[default]
    Info,
    /// Something recoverable went wrong.
    Warning,
    /// An operation failed.
    Error,
}

impl LogLevel {
    /// Returns the lowercase name used in telemetry payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}
