//! Gating error types.

use thiserror::Error;

/// Reasons a generation request does not produce an image.
///
/// The first three are gating outcomes (no network call was made, no quota
/// consumed); [`GenerateError::Failed`] is the single user-visible outcome
/// for any remote failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The requested style id is not in the catalog.
    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    /// The style is pro-only and the identity is on the free tier.
    /// The paywall has been requested; no quota was consumed.
    #[error("Style \"{style}\" requires an active subscription")]
    StyleRequiresPro {
        /// The pro-only style that was requested.
        style: String,
    },

    /// Today's generation quota is exhausted.
    #[error("Daily generation limit reached ({count}/{limit})")]
    DailyLimitReached {
        /// Generations already consumed today.
        count: u32,
        /// The daily limit in effect.
        limit: u32,
    },

    /// The remote generation call failed (transport, non-2xx, or a
    /// malformed response). Retryable; quota was not consumed.
    #[error("Could not generate image: {0}")]
    Failed(String),
}

impl GenerateError {
    /// True when retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerateError::Failed(_))
    }
}
