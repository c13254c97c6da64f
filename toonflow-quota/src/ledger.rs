//! The usage ledger.
//!
//! Single source of truth for "how many generations has this identity used
//! today, and how many remain". The counter lives in the device-local
//! key-value store and resets lazily on calendar-date rollover: a stale
//! record is observed as zero on read and only rewritten by the next
//! increment.

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use toonflow_core::{
    AnalyticsSink, Clock, ErrorSink, KeyValueStore, LogLevel, SessionProvider, SubscriptionTier,
    UsageRecord, UsageReport,
};

use crate::tier::TierResolver;

/// Storage key for today's generation count.
pub const USAGE_COUNT_KEY: &str = "toonflow_usage_count";

/// Storage key for the calendar date the count applies to.
pub const USAGE_DATE_KEY: &str = "toonflow_usage_date";

/// Analytics event emitted for every recorded generation.
const USAGE_EVENT: &str = "usage_recorded";

/// Per-day generation counter with tier-dependent limits.
///
/// All writes to the counter go through an internal mutex, so two
/// concurrent increments (e.g. a rapid double-tap) serialize instead of
/// losing an update. Storage failures degrade to safe defaults and are
/// reported to the error sink; they never reach the caller.
pub struct UsageLedger {
    store: Arc<dyn KeyValueStore>,
    tiers: Arc<TierResolver>,
    sessions: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    analytics: Arc<dyn AnalyticsSink>,
    errors: Arc<dyn ErrorSink>,
    write_lock: Mutex<()>,
    notify: watch::Sender<u64>,
}

impl UsageLedger {
    /// Creates a ledger over the given collaborators.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        tiers: Arc<TierResolver>,
        sessions: Arc<dyn SessionProvider>,
        clock: Arc<dyn Clock>,
        analytics: Arc<dyn AnalyticsSink>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            store,
            tiers,
            sessions,
            clock,
            analytics,
            errors,
            write_lock: Mutex::new(()),
            notify,
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Returns today's count and whether the limit is reached.
    ///
    /// A record from a previous day is observed as zero without being
    /// rewritten; the reset is persisted by the next increment.
    pub async fn current_usage(&self) -> UsageReport {
        let record = self.read_record().await;
        let limit = self.tiers.daily_limit().await;
        UsageReport::new(record.count, limit)
    }

    /// Records one generation and returns the updated report.
    ///
    /// Persists the incremented count together with today's date, then
    /// emits the fire-and-forget usage log. Logging failures are swallowed
    /// and reported to the error sink, never to the caller.
    pub async fn increment_usage(&self) -> UsageReport {
        let report = {
            let _guard = self.write_lock.lock().await;

            let record = self.read_record().await;
            let today = self.clock.today();
            let new_count = record.count + 1;

            self.persist(new_count, today).await;

            let limit = self.tiers.daily_limit().await;
            UsageReport::new(new_count, limit)
        };

        self.log_usage().await;
        self.notify.send_modify(|v| *v += 1);

        debug!(count = report.count, limit = report.limit, "Usage incremented");
        report
    }

    /// Generations left today. Never negative.
    pub async fn remaining_generations(&self) -> u32 {
        self.current_usage().await.remaining()
    }

    /// The daily limit for the current tier.
    pub async fn daily_limit(&self) -> u32 {
        self.tiers.daily_limit().await
    }

    /// Administrative reset: clears the persisted counter and date.
    pub async fn reset(&self) {
        let _guard = self.write_lock.lock().await;
        for key in [USAGE_COUNT_KEY, USAGE_DATE_KEY] {
            if let Err(e) = self.store.remove(key).await {
                self.errors.capture_exception(
                    &format!("failed to reset usage key: {e}"),
                    json!({ "key": key }),
                );
            }
        }
        self.notify.send_modify(|v| *v += 1);
    }

    /// Subscribes to ledger changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Reads the stored record, applying the lazy date rollover.
    async fn read_record(&self) -> UsageRecord {
        let today = self.clock.today();

        let stored_count = match self.store.get(USAGE_COUNT_KEY).await {
            Ok(value) => value,
            Err(e) => {
                self.errors.capture_exception(
                    &format!("failed to read usage count: {e}"),
                    json!({ "key": USAGE_COUNT_KEY }),
                );
                return UsageRecord::empty(today);
            }
        };
        let stored_date = match self.store.get(USAGE_DATE_KEY).await {
            Ok(value) => value,
            Err(e) => {
                self.errors.capture_exception(
                    &format!("failed to read usage date: {e}"),
                    json!({ "key": USAGE_DATE_KEY }),
                );
                return UsageRecord::empty(today);
            }
        };

        let Some(date) = stored_date.and_then(|raw| raw.parse::<NaiveDate>().ok()) else {
            return UsageRecord::empty(today);
        };

        let count = match stored_count.map(|raw| raw.parse::<u32>()) {
            Some(Ok(count)) => count,
            Some(Err(_)) => {
                self.errors.log_message(
                    "stored usage count is not a number, treating as zero",
                    LogLevel::Warning,
                    json!({ "key": USAGE_COUNT_KEY }),
                );
                0
            }
            None => 0,
        };

        UsageRecord { count, date }.observed_on(today)
    }

    /// Persists the counter and its date. Failures are reported, not
    /// surfaced: the in-memory report stays correct for this action.
    async fn persist(&self, count: u32, date: NaiveDate) {
        if let Err(e) = self.store.set(USAGE_COUNT_KEY, &count.to_string()).await {
            self.errors.capture_exception(
                &format!("failed to persist usage count: {e}"),
                json!({ "key": USAGE_COUNT_KEY }),
            );
        }
        if let Err(e) = self
            .store
            .set(USAGE_DATE_KEY, &date.format("%Y-%m-%d").to_string())
            .await
        {
            self.errors.capture_exception(
                &format!("failed to persist usage date: {e}"),
                json!({ "key": USAGE_DATE_KEY }),
            );
        }
    }

    /// Emits the server-side usage log through the analytics sink.
    async fn log_usage(&self) {
        let session = match self.sessions.current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.errors.log_message(
                    "no session found, cannot log usage",
                    LogLevel::Warning,
                    json!({}),
                );
                return;
            }
            Err(e) => {
                self.errors.capture_exception(
                    &format!("failed to resolve session for usage log: {e}"),
                    json!({}),
                );
                return;
            }
        };

        let tier: SubscriptionTier = self.tiers.current_tier().await;
        self.analytics.track(
            USAGE_EVENT,
            json!({
                "user_id": session.user_id,
                "is_anonymous": session.is_anonymous,
                "subscription_tier": tier.as_str(),
                "timestamp": self.clock.now().to_rfc3339(),
            }),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use toonflow_core::{CoreError, EntitlementProvider, Session};
    use toonflow_store::MemoryKvStore;

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    pub(crate) struct MockClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl MockClock {
        pub(crate) fn at(rfc3339: &str) -> Self {
            Self {
                now: StdMutex::new(rfc3339.parse().unwrap()),
            }
        }

        pub(crate) fn advance(&self, delta: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += delta;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn today(&self) -> chrono::NaiveDate {
            self.now().date_naive()
        }
    }

    struct FixedEntitlement(bool);

    #[async_trait]
    impl EntitlementProvider for FixedEntitlement {
        async fn is_entitled(&self) -> Result<bool, CoreError> {
            Ok(self.0)
        }
    }

    struct FailingEntitlement;

    #[async_trait]
    impl EntitlementProvider for FailingEntitlement {
        async fn is_entitled(&self) -> Result<bool, CoreError> {
            Err(CoreError::Entitlement("unreachable".to_string()))
        }
    }

    struct FixedSession;

    #[async_trait]
    impl SessionProvider for FixedSession {
        async fn current_session(&self) -> Result<Option<Session>, CoreError> {
            Ok(Some(Session::anonymous("device-1")))
        }
    }

    #[derive(Default)]
    struct CapturingAnalytics {
        events: StdMutex<Vec<(String, serde_json::Value)>>,
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
        messages: AtomicUsize,
    }

    impl ErrorSink for CapturingErrors {
        fn capture_exception(&self, _message: &str, _context: serde_json::Value) {
            self.exceptions.fetch_add(1, Ordering::SeqCst);
        }

        fn log_message(&self, _message: &str, _level: LogLevel, _context: serde_json::Value) {
            self.messages.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Store whose reads and writes can be made to fail.
    struct FlakyStore {
        inner: MemoryKvStore,
        fail: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryKvStore::new(),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Storage("disk gone".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Storage("disk gone".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), CoreError> {
            self.inner.remove(key).await
        }
    }

    // ------------------------------------------------------------------
    // Harness
    // ------------------------------------------------------------------

    struct Harness {
        ledger: UsageLedger,
        clock: Arc<MockClock>,
        analytics: Arc<CapturingAnalytics>,
        errors: Arc<CapturingErrors>,
        store: Arc<dyn KeyValueStore>,
    }

    fn harness_with(store: Arc<dyn KeyValueStore>, entitled: bool) -> Harness {
        let clock = Arc::new(MockClock::at("2025-06-01T10:00:00Z"));
        let analytics = Arc::new(CapturingAnalytics::default());
        let errors = Arc::new(CapturingErrors::default());
        let tiers = Arc::new(TierResolver::new(
            Arc::new(FixedEntitlement(entitled)),
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        ));
        let ledger = UsageLedger::new(
            Arc::clone(&store),
            tiers,
            Arc::new(FixedSession),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&analytics) as Arc<dyn AnalyticsSink>,
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        );
        Harness {
            ledger,
            clock,
            analytics,
            errors,
            store,
        }
    }

    fn harness(entitled: bool) -> Harness {
        harness_with(Arc::new(MemoryKvStore::new()), entitled)
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_free_tier_increments_to_limit() {
        let h = harness(false);

        let first = h.ledger.increment_usage().await;
        assert_eq!(first.count, 1);
        assert!(!first.limit_reached);

        let second = h.ledger.increment_usage().await;
        assert_eq!(second.count, 2);
        assert!(second.limit_reached);

        // Overshoot keeps counting, stays limit-reached.
        let third = h.ledger.increment_usage().await;
        assert_eq!(third.count, 3);
        assert!(third.limit_reached);
    }

    #[tokio::test]
    async fn test_n_increments_yield_count_n() {
        let h = harness(true);
        for n in 1..=5 {
            let report = h.ledger.increment_usage().await;
            assert_eq!(report.count, n);
            assert_eq!(report.limit_reached, n >= 100);
        }
    }

    #[tokio::test]
    async fn test_remaining_never_negative() {
        let h = harness(false);
        for _ in 0..5 {
            h.ledger.increment_usage().await;
        }
        assert_eq!(h.ledger.remaining_generations().await, 0);
    }

    #[tokio::test]
    async fn test_pro_remaining_after_five() {
        let h = harness(true);
        for _ in 0..5 {
            h.ledger.increment_usage().await;
        }
        assert_eq!(h.ledger.remaining_generations().await, 95);
    }

    #[tokio::test]
    async fn test_daily_limit_by_tier() {
        assert_eq!(harness(false).ledger.daily_limit().await, 2);
        assert_eq!(harness(true).ledger.daily_limit().await, 100);
    }

    #[tokio::test]
    async fn test_date_rollover_resets_on_read() {
        let h = harness(false);
        h.ledger.increment_usage().await;
        h.ledger.increment_usage().await;
        assert!(h.ledger.current_usage().await.limit_reached);

        // Cross midnight; the next read observes zero without any reset call.
        h.clock.advance(Duration::hours(15));
        let report = h.ledger.current_usage().await;
        assert_eq!(report.count, 0);
        assert!(!report.limit_reached);

        // The stored (stale) count is untouched until the next increment.
        let stored = h.store.get(USAGE_COUNT_KEY).await.unwrap();
        assert_eq!(stored.as_deref(), Some("2"));

        let report = h.ledger.increment_usage().await;
        assert_eq!(report.count, 1);
        let stored = h.store.get(USAGE_DATE_KEY).await.unwrap();
        assert_eq!(stored.as_deref(), Some("2025-06-02"));
    }

    #[tokio::test]
    async fn test_two_minute_window_across_midnight_allows_both() {
        let h = harness(false);
        // 23:59 local on day one...
        h.clock.advance(Duration::hours(13) + Duration::minutes(59));
        h.ledger.increment_usage().await;
        h.ledger.increment_usage().await;
        assert!(h.ledger.current_usage().await.limit_reached);

        // ...00:01 the next day belongs to a fresh window.
        h.clock.advance(Duration::minutes(2));
        assert!(!h.ledger.current_usage().await.limit_reached);
    }

    #[tokio::test]
    async fn test_entitlement_failure_falls_back_to_free_limit() {
        let errors = Arc::new(CapturingErrors::default());
        let tiers = Arc::new(TierResolver::new(
            Arc::new(FailingEntitlement),
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        ));
        let ledger = UsageLedger::new(
            Arc::new(MemoryKvStore::new()),
            tiers,
            Arc::new(FixedSession),
            Arc::new(MockClock::at("2025-06-01T10:00:00Z")),
            Arc::new(CapturingAnalytics::default()),
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        );

        assert_eq!(ledger.daily_limit().await, 2);
        assert!(errors.exceptions.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_increment_emits_usage_log() {
        let h = harness(false);
        h.ledger.increment_usage().await;

        let events = h.analytics.events.lock().unwrap();
        let (name, props) = &events[0];
        assert_eq!(name, USAGE_EVENT);
        assert_eq!(props["user_id"], "device-1");
        assert_eq!(props["is_anonymous"], true);
        assert_eq!(props["subscription_tier"], "free");
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_to_safe_defaults() {
        let store = Arc::new(FlakyStore::new());
        store.fail.store(true, Ordering::SeqCst);
        let h = harness_with(Arc::clone(&store) as Arc<dyn KeyValueStore>, false);

        // Reads degrade to an empty record; increments still report locally.
        let report = h.ledger.current_usage().await;
        assert_eq!(report.count, 0);

        let report = h.ledger.increment_usage().await;
        assert_eq!(report.count, 1);
        assert!(h.errors.exceptions.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_serialize() {
        let h = Arc::new(harness(true));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let h = Arc::clone(&h);
            handles.push(tokio::spawn(async move {
                h.ledger.increment_usage().await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(h.ledger.current_usage().await.count, 10);
    }

    #[tokio::test]
    async fn test_reset_clears_counter() {
        let h = harness(false);
        h.ledger.increment_usage().await;
        h.ledger.reset().await;
        assert_eq!(h.ledger.current_usage().await.count, 0);
        assert_eq!(h.store.get(USAGE_COUNT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_subscribe_sees_increments() {
        let h = harness(false);
        let mut rx = h.ledger.subscribe();
        h.ledger.increment_usage().await;
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_count_treated_as_zero() {
        let h = harness(false);
        h.store.set(USAGE_COUNT_KEY, "not-a-number").await.unwrap();
        h.store.set(USAGE_DATE_KEY, "2025-06-01").await.unwrap();

        let report = h.ledger.current_usage().await;
        assert_eq!(report.count, 0);
        assert!(h.errors.messages.load(Ordering::SeqCst) >= 1);
    }
}
