//! Subscription tier and daily limit constants.

use serde::{Deserialize, Serialize};

/// Daily generation limit for the free tier.
pub const FREE_DAILY_LIMIT: u32 = 2;

/// Daily generation limit for the pro tier.
pub const PRO_DAILY_LIMIT: u32 = 100;

/// The subscription tier of the current identity.
///
/// Derived, never stored: computed on demand from the entitlement provider.
/// When the provider cannot be reached, callers must fail safe to
/// [`SubscriptionTier::Free`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// No active paid entitlement.
    #[default]
    Free,
    /// Active paid entitlement.
    Pro,
}

impl SubscriptionTier {
    /// Builds a tier from an entitlement check result.
    pub fn from_entitled(entitled: bool) -> Self {
        if entitled {
            SubscriptionTier::Pro
        } else {
            SubscriptionTier::Free
        }
    }

    /// Returns the daily generation limit for this tier.
    pub fn daily_limit(self) -> u32 {
        match self {
            SubscriptionTier::Free => FREE_DAILY_LIMIT,
            SubscriptionTier::Pro => PRO_DAILY_LIMIT,
        }
    }

    /// Returns true if this tier carries a paid entitlement.
    pub fn is_pro(self) -> bool {
        matches!(self, SubscriptionTier::Pro)
    }

    /// Returns the lowercase name used in telemetry payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
