//! The generation orchestrator.
//!
//! Every generation attempt goes through here. Gating happens before the
//! backend is touched (unknown style, pro-only style, exhausted quota);
//! the quota increment happens only after the backend succeeds, so a
//! failed call never consumes an attempt.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use toonflow_core::{
    AnalyticsSink, ErrorSink, GeneratedImage, GenerationBackend, GenerationRequest, UsageReport,
};

use crate::error::GenerateError;
use crate::ledger::UsageLedger;
use crate::paywall::PaywallGate;
use crate::styles::StyleCatalog;
use crate::tier::TierResolver;

/// A successful, quota-accounted generation.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// The transformed image.
    pub image: GeneratedImage,
    /// Usage after this generation was recorded.
    pub usage: UsageReport,
}

/// Gatekeeper in front of the remote generation endpoint.
pub struct GenerationOrchestrator {
    ledger: Arc<UsageLedger>,
    gate: Arc<PaywallGate>,
    tiers: Arc<TierResolver>,
    backend: Arc<dyn GenerationBackend>,
    analytics: Arc<dyn AnalyticsSink>,
    errors: Arc<dyn ErrorSink>,
    paywall_on_limit: bool,
}

impl GenerationOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        ledger: Arc<UsageLedger>,
        gate: Arc<PaywallGate>,
        tiers: Arc<TierResolver>,
        backend: Arc<dyn GenerationBackend>,
        analytics: Arc<dyn AnalyticsSink>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            ledger,
            gate,
            tiers,
            backend,
            analytics,
            errors,
            paywall_on_limit: true,
        }
    }

    /// Disables the forced paywall on quota exhaustion (the error is still
    /// returned).
    pub fn without_limit_paywall(mut self) -> Self {
        self.paywall_on_limit = false;
        self
    }

    /// Runs one gated generation.
    ///
    /// Checks run in order: style exists, style tier, daily quota. Only
    /// when all pass is the backend called, and only on backend success is
    /// the quota incremented.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerateError`] describing which gate refused the
    /// request, or [`GenerateError::Failed`] when the backend call failed.
    pub async fn generate(
        &self,
        style_id: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<GenerationResult, GenerateError> {
        let Some(style) = StyleCatalog::get(style_id) else {
            return Err(GenerateError::UnknownStyle(style_id.to_string()));
        };

        let tier = self.tiers.current_tier().await;
        self.analytics.track(
            "generation_requested",
            json!({ "style": style.id, "subscription_tier": tier.as_str() }),
        );

        if style.requires_pro && !tier.is_pro() {
            self.gate.forced_display("pro_style").await;
            return Err(GenerateError::StyleRequiresPro {
                style: style.id.clone(),
            });
        }

        let usage = self.ledger.current_usage().await;
        if usage.limit_reached {
            if self.paywall_on_limit {
                self.gate.forced_display("daily_limit").await;
            }
            return Err(GenerateError::DailyLimitReached {
                count: usage.count,
                limit: usage.limit,
            });
        }

        let request = GenerationRequest::new(
            BASE64_STANDARD.encode(image),
            mime_type,
            style.prompt.clone(),
        );
        debug!(style = %style.id, bytes = image.len(), "Dispatching generation");

        let response = match self.backend.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.errors.capture_exception(
                    &format!("generation failed: {e}"),
                    json!({ "style": style.id }),
                );
                self.analytics.track(
                    "generation_failed",
                    json!({ "style": style.id, "error": e.to_string() }),
                );
                return Err(GenerateError::Failed(e.to_string()));
            }
        };

        // Quota is charged only for a delivered image.
        let usage = self.ledger.increment_usage().await;
        self.analytics.track(
            "generation_completed",
            json!({
                "style": style.id,
                "subscription_tier": tier.as_str(),
                "remaining": usage.remaining(),
            }),
        );
        info!(style = %style.id, count = usage.count, limit = usage.limit, "Generation completed");

        Ok(GenerationResult {
            image: GeneratedImage::from_response(response),
            usage,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use toonflow_core::{
        Clock, CoreError, EntitlementProvider, GenerationResponse, KeyValueStore, LogLevel,
        Session, SessionProvider,
    };
    use toonflow_store::MemoryKvStore;

    use crate::ledger::tests::MockClock;
    use crate::paywall::GateConfig;

    struct FixedEntitlement(bool);

    #[async_trait]
    impl EntitlementProvider for FixedEntitlement {
        async fn is_entitled(&self) -> Result<bool, CoreError> {
            Ok(self.0)
        }
    }

    struct FixedSession;

    #[async_trait]
    impl SessionProvider for FixedSession {
        async fn current_session(&self) -> Result<Option<Session>, CoreError> {
            Ok(Some(Session::anonymous("device-1")))
        }
    }

    struct MockBackend {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for MockBackend {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GenerationResponse, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::GenerationFailed("server error 500".to_string()));
            }
            Ok(GenerationResponse {
                image: Some("c3R5bGl6ZWQ=".to_string()),
                image_url: None,
                mime_type: "image/png".to_string(),
                accompanying_text: None,
            })
        }
    }

    #[derive(Default)]
    struct CapturingAnalytics {
        events: StdMutex<Vec<(String, serde_json::Value)>>,
    }

    impl CapturingAnalytics {
        fn names(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }
    }

    impl AnalyticsSink for CapturingAnalytics {
        fn track(&self, event: &str, properties: serde_json::Value) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), properties));
        }
    }

    #[derive(Default)]
    struct CapturingErrors {
        exceptions: AtomicUsize,
    }

    impl ErrorSink for CapturingErrors {
        fn capture_exception(&self, _message: &str, _context: serde_json::Value) {
            self.exceptions.fetch_add(1, Ordering::SeqCst);
        }

        fn log_message(&self, _message: &str, _level: LogLevel, _context: serde_json::Value) {}
    }

    struct Harness {
        orchestrator: GenerationOrchestrator,
        ledger: Arc<UsageLedger>,
        backend: Arc<MockBackend>,
        analytics: Arc<CapturingAnalytics>,
        errors: Arc<CapturingErrors>,
        store: Arc<MemoryKvStore>,
    }

    fn harness(entitled: bool) -> Harness {
        let clock = Arc::new(MockClock::at("2025-06-01T10:00:00Z"));
        let analytics = Arc::new(CapturingAnalytics::default());
        let errors = Arc::new(CapturingErrors::default());
        let store = Arc::new(MemoryKvStore::new());
        let backend = Arc::new(MockBackend::new());
        let tiers = Arc::new(TierResolver::new(
            Arc::new(FixedEntitlement(entitled)),
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        ));
        let ledger = Arc::new(UsageLedger::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            Arc::clone(&tiers),
            Arc::new(FixedSession),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&analytics) as Arc<dyn AnalyticsSink>,
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        ));
        let gate = Arc::new(PaywallGate::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            Arc::clone(&tiers),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&analytics) as Arc<dyn AnalyticsSink>,
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
            GateConfig::default(),
        ));
        let orchestrator = GenerationOrchestrator::new(
            Arc::clone(&ledger),
            gate,
            tiers,
            Arc::clone(&backend) as Arc<dyn GenerationBackend>,
            Arc::clone(&analytics) as Arc<dyn AnalyticsSink>,
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        );
        Harness {
            orchestrator,
            ledger,
            backend,
            analytics,
            errors,
            store,
        }
    }

    const PHOTO: &[u8] = b"raw photo bytes";

    #[tokio::test]
    async fn test_successful_generation_charges_quota() {
        let h = harness(false);
        let result = h
            .orchestrator
            .generate("ghibli", PHOTO, "image/jpeg")
            .await
            .unwrap();

        assert_eq!(result.usage.count, 1);
        assert_eq!(result.image.mime_type, "image/png");
        assert_eq!(h.backend.calls.load(Ordering::SeqCst), 1);
        assert!(h.analytics.names().contains(&"generation_completed".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_style_is_rejected_before_backend() {
        let h = harness(false);
        let err = h
            .orchestrator
            .generate("neon_noir", PHOTO, "image/jpeg")
            .await
            .unwrap_err();

        assert_eq!(err, GenerateError::UnknownStyle("neon_noir".to_string()));
        assert_eq!(h.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pro_style_blocked_for_free_tier() {
        let h = harness(false);
        let err = h
            .orchestrator
            .generate("anime", PHOTO, "image/jpeg")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GenerateError::StyleRequiresPro {
                style: "anime".to_string()
            }
        );
        // No backend call, no quota consumed, but a forced paywall was shown.
        assert_eq!(h.backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.ledger.current_usage().await.count, 0);
        assert!(h.analytics.names().contains(&"paywall_shown".to_string()));
    }

    #[tokio::test]
    async fn test_pro_style_allowed_for_pro_tier() {
        let h = harness(true);
        let result = h
            .orchestrator
            .generate("anime", PHOTO, "image/jpeg")
            .await
            .unwrap();
        assert_eq!(result.usage.count, 1);
    }

    #[tokio::test]
    async fn test_limit_reached_blocks_and_forces_paywall() {
        let h = harness(false);
        h.orchestrator
            .generate("ghibli", PHOTO, "image/jpeg")
            .await
            .unwrap();
        h.orchestrator
            .generate("ghibli", PHOTO, "image/jpeg")
            .await
            .unwrap();

        let err = h
            .orchestrator
            .generate("ghibli", PHOTO, "image/jpeg")
            .await
            .unwrap_err();
        assert_eq!(err, GenerateError::DailyLimitReached { count: 2, limit: 2 });
        assert_eq!(h.backend.calls.load(Ordering::SeqCst), 2);

        let shows = h
            .analytics
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, props)| name == "paywall_shown" && props["forced"] == true)
            .count();
        assert_eq!(shows, 1);
    }

    #[tokio::test]
    async fn test_backend_failure_does_not_charge_quota() {
        let h = harness(false);
        h.backend.fail.store(true, Ordering::SeqCst);

        let err = h
            .orchestrator
            .generate("ghibli", PHOTO, "image/jpeg")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(h.ledger.current_usage().await.count, 0);
        assert_eq!(h.errors.exceptions.load(Ordering::SeqCst), 1);

        // Retry after recovery still has the full quota.
        h.backend.fail.store(false, Ordering::SeqCst);
        let result = h
            .orchestrator
            .generate("ghibli", PHOTO, "image/jpeg")
            .await
            .unwrap();
        assert_eq!(result.usage.count, 1);
    }

    #[tokio::test]
    async fn test_limit_paywall_can_be_disabled() {
        let h = harness(false);
        let orchestrator = GenerationOrchestrator::new(
            Arc::clone(&h.ledger),
            Arc::new(PaywallGate::new(
                Arc::clone(&h.store) as Arc<dyn KeyValueStore>,
                Arc::new(TierResolver::new(
                    Arc::new(FixedEntitlement(false)),
                    Arc::clone(&h.errors) as Arc<dyn ErrorSink>,
                )),
                Arc::new(MockClock::at("2025-06-01T10:00:00Z")),
                Arc::clone(&h.analytics) as Arc<dyn AnalyticsSink>,
                Arc::clone(&h.errors) as Arc<dyn ErrorSink>,
                GateConfig::default(),
            )),
            Arc::new(TierResolver::new(
                Arc::new(FixedEntitlement(false)),
                Arc::clone(&h.errors) as Arc<dyn ErrorSink>,
            )),
            Arc::clone(&h.backend) as Arc<dyn GenerationBackend>,
            Arc::clone(&h.analytics) as Arc<dyn AnalyticsSink>,
            Arc::clone(&h.errors) as Arc<dyn ErrorSink>,
        )
        .without_limit_paywall();

        orchestrator.generate("ghibli", PHOTO, "image/jpeg").await.unwrap();
        orchestrator.generate("ghibli", PHOTO, "image/jpeg").await.unwrap();
        let before = h.analytics.names().len();
        let err = orchestrator
            .generate("ghibli", PHOTO, "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::DailyLimitReached { .. }));

        // Only the request event fired; no forced paywall_shown.
        let names = h.analytics.names();
        assert_eq!(names.len(), before + 1);
        assert_eq!(names.last().map(String::as_str), Some("generation_requested"));
    }
}
