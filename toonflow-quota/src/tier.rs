//! Subscription tier resolution.
//!
//! One shared resolver replaces the ad hoc entitlement checks that were
//! scattered across call sites, so a single user action cannot observe
//! divergent entitlement states.

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use toonflow_core::{EntitlementProvider, ErrorSink, SubscriptionTier};

/// How long a resolved tier stays valid before the provider is asked again.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

struct CachedTier {
    tier: SubscriptionTier,
    fetched_at: Instant,
}

/// Cached, fail-safe view of the current subscription tier.
///
/// A provider error is never propagated: the resolver reports the free
/// tier (never silently unlimited) and sends the failure to the error
/// sink. Failed lookups are not cached, so recovery is immediate.
pub struct TierResolver {
    entitlements: Arc<dyn EntitlementProvider>,
    errors: Arc<dyn ErrorSink>,
    cache: Mutex<Option<CachedTier>>,
    ttl: Duration,
}

impl TierResolver {
    /// Creates a resolver with the default cache TTL.
    pub fn new(entitlements: Arc<dyn EntitlementProvider>, errors: Arc<dyn ErrorSink>) -> Self {
        Self {
            entitlements,
            errors,
            cache: Mutex::new(None),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Overrides the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Resolves the current tier, consulting the cache first.
    pub async fn current_tier(&self) -> SubscriptionTier {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return cached.tier;
            }
        }

        match self.entitlements.is_entitled().await {
            Ok(entitled) => {
                let tier = SubscriptionTier::from_entitled(entitled);
                debug!(tier = tier.as_str(), "Resolved subscription tier");
                *cache = Some(CachedTier {
                    tier,
                    fetched_at: Instant::now(),
                });
                tier
            }
            Err(e) => {
                self.errors.capture_exception(
                    &format!("entitlement check failed: {e}"),
                    json!({ "component": "tier_resolver" }),
                );
                SubscriptionTier::Free
            }
        }
    }

    /// The daily generation limit for the current tier.
    pub async fn daily_limit(&self) -> u32 {
        self.current_tier().await.daily_limit()
    }

    /// Drops the cached tier, forcing the next resolution to hit the
    /// provider (e.g. after a purchase or restore).
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
