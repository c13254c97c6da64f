//! The paywall gate.
//!
//! Decides when the paywall must be shown, when it is suppressed, and what
//! dismissing it means. Dismissal grants a grace period during which the
//! gate stays quiet; hard paywalls (limit reached, pro-only style) bypass
//! both grace and the per-screen checks.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use toonflow_core::{AnalyticsSink, Clock, ErrorSink, KeyValueStore, LogLevel};

use crate::tier::TierResolver;

/// Storage key for the grace-period expiry, unix epoch milliseconds.
pub const GRACE_UNTIL_KEY: &str = "toonflow_grace_until";

/// Storage key for the date the paywall was last shown.
pub const PAYWALL_SHOWN_DATE_KEY: &str = "toonflow_paywall_date";

/// Storage key for the debug kill switch that suppresses the paywall.
pub const PAYWALL_DISABLED_KEY: &str = "toonflow_paywall_disabled";

// ============================================================================
// Configuration and decision types
// ============================================================================

/// Timing knobs for the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    /// How long a manual dismissal keeps the paywall away.
    pub grace_period: Duration,
    /// Delay before a routine (non-forced) paywall appears, so navigation
    /// settles first.
    pub show_delay: Duration,
    /// How long a hard paywall hides its close affordance.
    pub close_delay: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(30 * 60),
            show_delay: Duration::from_millis(300),
            close_delay: Duration::from_secs(5),
        }
    }
}

/// The screen the user is currently on, as far as gating cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// The main stylization screen.
    Home,
    /// The saved-results gallery.
    Gallery,
    /// App settings.
    Settings,
    /// The paywall itself.
    Paywall,
}

impl Screen {
    /// Stable lowercase name, used in telemetry.
    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Gallery => "gallery",
            Screen::Settings => "settings",
            Screen::Paywall => "paywall",
        }
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "home" => Ok(Screen::Home),
            "gallery" => Ok(Screen::Gallery),
            "settings" => Ok(Screen::Settings),
            "paywall" => Ok(Screen::Paywall),
            other => Err(format!("unknown screen: {other}")),
        }
    }
}

/// Why a routine paywall check decided not to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The identity already holds an active subscription.
    Entitled,
    /// A dismissal grace period is still running.
    GraceActive,
    /// The paywall is already on screen.
    AlreadyOnPaywall,
    /// Suppressed by the debug kill switch.
    DebugDisabled,
}

impl SuppressReason {
    /// Stable lowercase name, used in telemetry and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            SuppressReason::Entitled => "entitled",
            SuppressReason::GraceActive => "grace_active",
            SuppressReason::AlreadyOnPaywall => "already_on_paywall",
            SuppressReason::DebugDisabled => "debug_disabled",
        }
    }
}

/// Outcome of a paywall evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaywallDecision {
    /// Show the paywall after `delay`. `forced` marks a hard paywall
    /// (limit reached or pro-only style) that delays its close control.
    Show {
        /// Wait this long before presenting.
        delay: Duration,
        /// Hard paywall: bypassed grace and entitlement checks.
        forced: bool,
    },
    /// Do not show.
    Suppressed(SuppressReason),
}

impl PaywallDecision {
    /// True when the decision is to show.
    pub fn must_show(&self) -> bool {
        matches!(self, PaywallDecision::Show { .. })
    }
}

/// A paywall currently on screen. Tracks when its close control unlocks.
#[derive(Debug, Clone, Copy)]
pub struct PaywallSession {
    shown_at: DateTime<Utc>,
    close_delay: Duration,
}

impl PaywallSession {
    /// Creates a session for a paywall that appeared at `shown_at`.
    pub fn new(shown_at: DateTime<Utc>, close_delay: Duration) -> Self {
        Self {
            shown_at,
            close_delay,
        }
    }

    /// Whether the close control is visible at `now`.
    pub fn close_visible(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.shown_at);
        let close_delay = chrono::Duration::from_std(self.close_delay)
            .unwrap_or_else(|_| chrono::Duration::zero());
        elapsed >= close_delay
    }
}

/// Result of a dismiss attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    /// Dismissed; the paywall stays away until `until`.
    ///
    /// The grace is best-effort: when persisting it failed (reported to
    /// the error sink), the dismissal itself still stands but later
    /// evaluations may show again.
    GraceStarted {
        /// When the grace period expires.
        until: DateTime<Utc>,
    },
    /// The close control is not visible yet; the paywall stays up.
    Blocked,
}

// ============================================================================
// Gate
// ============================================================================

/// Paywall display policy.
///
/// Evaluation is fail-open toward showing: if the grace record cannot be
/// read the gate does not suppress, since a missed paywall costs revenue
/// while a spurious one costs a tap.
pub struct PaywallGate {
    store: Arc<dyn KeyValueStore>,
    tiers: Arc<TierResolver>,
    clock: Arc<dyn Clock>,
    analytics: Arc<dyn AnalyticsSink>,
    errors: Arc<dyn ErrorSink>,
    config: GateConfig,
    notify: watch::Sender<u64>,
}

impl PaywallGate {
    /// Creates a gate over the given collaborators.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        tiers: Arc<TierResolver>,
        clock: Arc<dyn Clock>,
        analytics: Arc<dyn AnalyticsSink>,
        errors: Arc<dyn ErrorSink>,
        config: GateConfig,
    ) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            store,
            tiers,
            clock,
            analytics,
            errors,
            config,
            notify,
        }
    }

    // ========================================================================
    // Decisions
    // ========================================================================

    /// Routine evaluation on navigating to `screen`.
    ///
    /// Checks, in order: already on the paywall, debug kill switch, active
    /// subscription, running grace period. If nothing suppresses, records
    /// today as shown and returns a delayed, dismissible show.
    pub async fn evaluate(&self, screen: Screen) -> PaywallDecision {
        if screen == Screen::Paywall {
            return PaywallDecision::Suppressed(SuppressReason::AlreadyOnPaywall);
        }
        if self.debug_disabled().await {
            return PaywallDecision::Suppressed(SuppressReason::DebugDisabled);
        }
        if self.tiers.current_tier().await.is_pro() {
            return PaywallDecision::Suppressed(SuppressReason::Entitled);
        }
        if self.grace_active().await {
            return PaywallDecision::Suppressed(SuppressReason::GraceActive);
        }

        self.mark_shown().await;
        self.analytics.track(
            "paywall_shown",
            json!({ "screen": screen.as_str(), "forced": false }),
        );
        debug!(screen = screen.as_str(), "Paywall scheduled");
        PaywallDecision::Show {
            delay: self.config.show_delay,
            forced: false,
        }
    }

    /// Hard paywall, triggered by a gating event (`daily_limit`,
    /// `pro_style`). Bypasses every suppression check and shows
    /// immediately with the close control delayed.
    pub async fn forced_display(&self, source: &str) -> PaywallDecision {
        self.mark_shown().await;
        self.analytics.track(
            "paywall_shown",
            json!({ "source": source, "forced": true }),
        );
        debug!(source, "Forced paywall");
        PaywallDecision::Show {
            delay: Duration::ZERO,
            forced: true,
        }
    }

    /// Starts tracking a paywall that just appeared on screen.
    pub fn begin_session(&self) -> PaywallSession {
        PaywallSession::new(self.clock.now(), self.config.close_delay)
    }

    /// The gate's timing configuration.
    pub fn config(&self) -> GateConfig {
        self.config
    }

    /// Attempts to dismiss the paywall.
    ///
    /// While the close control is hidden the attempt is [`DismissOutcome::Blocked`];
    /// afterwards a grace period starts. The grace write is best-effort:
    /// a failure is reported and the dismissal still succeeds, but the
    /// suppression was not persisted and the next evaluation will show.
    pub async fn dismiss(&self, session: &PaywallSession) -> DismissOutcome {
        let now = self.clock.now();
        if !session.close_visible(now) {
            return DismissOutcome::Blocked;
        }

        let grace_millis = i64::try_from(self.config.grace_period.as_millis()).unwrap_or(i64::MAX);
        let until = now + chrono::Duration::milliseconds(grace_millis);

        if let Err(e) = self
            .store
            .set(GRACE_UNTIL_KEY, &until.timestamp_millis().to_string())
            .await
        {
            self.errors.capture_exception(
                &format!("failed to persist grace period: {e}"),
                json!({ "key": GRACE_UNTIL_KEY }),
            );
        }

        self.analytics.track(
            "paywall_dismissed",
            json!({ "grace_until": until.to_rfc3339() }),
        );
        self.notify.send_modify(|v| *v += 1);
        DismissOutcome::GraceStarted { until }
    }

    /// Hardware back while the paywall is up follows the same rules as
    /// tapping close.
    pub async fn back_pressed(&self, session: &PaywallSession) -> DismissOutcome {
        self.dismiss(session).await
    }

    // ========================================================================
    // State queries
    // ========================================================================

    /// Whether a dismissal grace period is currently running.
    ///
    /// Expired or unreadable records are purged. A storage read failure
    /// reports and returns false, so the paywall is not suppressed on
    /// guesswork.
    pub async fn grace_active(&self) -> bool {
        let raw = match self.store.get(GRACE_UNTIL_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                self.errors.log_message(
                    &format!("failed to read grace period: {e}"),
                    LogLevel::Warning,
                    json!({ "key": GRACE_UNTIL_KEY }),
                );
                return false;
            }
        };

        match raw.parse::<i64>() {
            Ok(until_millis) => {
                if self.clock.now_millis() < until_millis {
                    true
                } else {
                    self.clear_grace().await;
                    false
                }
            }
            Err(_) => {
                self.errors.capture_exception(
                    "stored grace period is not a timestamp",
                    json!({ "key": GRACE_UNTIL_KEY, "value": raw }),
                );
                self.clear_grace().await;
                false
            }
        }
    }

    /// Removes any persisted grace period.
    pub async fn clear_grace(&self) {
        if let Err(e) = self.store.remove(GRACE_UNTIL_KEY).await {
            self.errors.capture_exception(
                &format!("failed to clear grace period: {e}"),
                json!({ "key": GRACE_UNTIL_KEY }),
            );
        }
        self.notify.send_modify(|v| *v += 1);
    }

    /// Whether the paywall was already shown today.
    pub async fn shown_today(&self) -> bool {
        match self.store.get(PAYWALL_SHOWN_DATE_KEY).await {
            Ok(Some(date)) => date == self.clock.today().to_string(),
            Ok(None) => false,
            Err(e) => {
                self.errors.log_message(
                    &format!("failed to read paywall marker: {e}"),
                    LogLevel::Warning,
                    json!({ "key": PAYWALL_SHOWN_DATE_KEY }),
                );
                false
            }
        }
    }

    /// Flips the debug kill switch.
    pub async fn set_debug_disabled(&self, disabled: bool) {
        let result = if disabled {
            self.store.set(PAYWALL_DISABLED_KEY, "true").await
        } else {
            self.store.remove(PAYWALL_DISABLED_KEY).await
        };
        if let Err(e) = result {
            self.errors.capture_exception(
                &format!("failed to update paywall kill switch: {e}"),
                json!({ "key": PAYWALL_DISABLED_KEY }),
            );
        }
        self.notify.send_modify(|v| *v += 1);
    }

    /// Subscribes to gate state changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    async fn debug_disabled(&self) -> bool {
        matches!(
            self.store.get(PAYWALL_DISABLED_KEY).await,
            Ok(Some(value)) if value == "true"
        )
    }

    async fn mark_shown(&self) {
        let today = self.clock.today().to_string();
        if let Err(e) = self.store.set(PAYWALL_SHOWN_DATE_KEY, &today).await {
            self.errors.capture_exception(
                &format!("failed to persist paywall marker: {e}"),
                json!({ "key": PAYWALL_SHOWN_DATE_KEY }),
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use toonflow_core::{CoreError, EntitlementProvider};
    use toonflow_store::MemoryKvStore;

    use crate::ledger::tests::MockClock;

    struct FixedEntitlement(bool);

    #[async_trait]
    impl EntitlementProvider for FixedEntitlement {
        async fn is_entitled(&self) -> Result<bool, CoreError> {
            Ok(self.0)
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

    /// Store where every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CoreError> {
            Err(CoreError::Storage("disk gone".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), CoreError> {
            Err(CoreError::Storage("disk gone".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), CoreError> {
            Err(CoreError::Storage("disk gone".to_string()))
        }
    }

    struct Harness {
        gate: PaywallGate,
        clock: Arc<MockClock>,
        analytics: Arc<CapturingAnalytics>,
        store: Arc<MemoryKvStore>,
    }

    fn harness(entitled: bool) -> Harness {
        harness_config(entitled, GateConfig::default())
    }

    fn harness_config(entitled: bool, config: GateConfig) -> Harness {
        let clock = Arc::new(MockClock::at("2025-06-01T10:00:00Z"));
        let analytics = Arc::new(CapturingAnalytics::default());
        let errors = Arc::new(CapturingErrors::default());
        let store = Arc::new(MemoryKvStore::new());
        let tiers = Arc::new(TierResolver::new(
            Arc::new(FixedEntitlement(entitled)),
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        ));
        let gate = PaywallGate::new(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            tiers,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&analytics) as Arc<dyn AnalyticsSink>,
            errors,
            config,
        );
        Harness {
            gate,
            clock,
            analytics,
            store,
        }
    }

    #[tokio::test]
    async fn test_free_user_sees_delayed_paywall() {
        let h = harness(false);
        let decision = h.gate.evaluate(Screen::Home).await;
        assert_eq!(
            decision,
            PaywallDecision::Show {
                delay: Duration::from_millis(300),
                forced: false
            }
        );
        assert!(h.gate.shown_today().await);
    }

    #[tokio::test]
    async fn test_entitled_user_is_suppressed() {
        let h = harness(true);
        let decision = h.gate.evaluate(Screen::Home).await;
        assert_eq!(
            decision,
            PaywallDecision::Suppressed(SuppressReason::Entitled)
        );
    }

    #[tokio::test]
    async fn test_paywall_screen_never_restacks() {
        let h = harness(false);
        let decision = h.gate.evaluate(Screen::Paywall).await;
        assert_eq!(
            decision,
            PaywallDecision::Suppressed(SuppressReason::AlreadyOnPaywall)
        );
    }

    #[tokio::test]
    async fn test_dismiss_starts_grace_and_suppresses() {
        let h = harness(false);
        assert!(h.gate.evaluate(Screen::Home).await.must_show());

        let session = h.gate.begin_session();
        h.clock.advance(ChronoDuration::seconds(6));
        let outcome = h.gate.dismiss(&session).await;
        assert!(matches!(outcome, DismissOutcome::GraceStarted { .. }));

        let decision = h.gate.evaluate(Screen::Home).await;
        assert_eq!(
            decision,
            PaywallDecision::Suppressed(SuppressReason::GraceActive)
        );
    }

    #[tokio::test]
    async fn test_grace_expires_and_record_is_purged() {
        let h = harness(false);
        let session = h.gate.begin_session();
        h.clock.advance(ChronoDuration::seconds(6));
        h.gate.dismiss(&session).await;
        assert!(h.gate.grace_active().await);

        h.clock.advance(ChronoDuration::minutes(31));
        assert!(!h.gate.grace_active().await);
        assert_eq!(h.store.get(GRACE_UNTIL_KEY).await.unwrap(), None);
        assert!(h.gate.evaluate(Screen::Home).await.must_show());
    }

    #[tokio::test]
    async fn test_close_blocked_before_delay_elapses() {
        let h = harness(false);
        let session = h.gate.begin_session();

        h.clock.advance(ChronoDuration::seconds(3));
        assert_eq!(h.gate.dismiss(&session).await, DismissOutcome::Blocked);
        assert_eq!(h.gate.back_pressed(&session).await, DismissOutcome::Blocked);

        h.clock.advance(ChronoDuration::seconds(3));
        assert!(matches!(
            h.gate.dismiss(&session).await,
            DismissOutcome::GraceStarted { .. }
        ));
    }

    #[tokio::test]
    async fn test_forced_display_bypasses_grace_and_entitlement() {
        let h = harness(true);
        let session = h.gate.begin_session();
        h.clock.advance(ChronoDuration::seconds(6));
        h.gate.dismiss(&session).await;

        let decision = h.gate.forced_display("daily_limit").await;
        assert_eq!(
            decision,
            PaywallDecision::Show {
                delay: Duration::ZERO,
                forced: true
            }
        );
    }

    #[tokio::test]
    async fn test_debug_kill_switch() {
        let h = harness(false);
        h.gate.set_debug_disabled(true).await;
        assert_eq!(
            h.gate.evaluate(Screen::Home).await,
            PaywallDecision::Suppressed(SuppressReason::DebugDisabled)
        );

        h.gate.set_debug_disabled(false).await;
        assert!(h.gate.evaluate(Screen::Home).await.must_show());
    }

    #[tokio::test]
    async fn test_corrupt_grace_record_is_purged_not_trusted() {
        let h = harness(false);
        h.store.set(GRACE_UNTIL_KEY, "garbage").await.unwrap();

        assert!(!h.gate.grace_active().await);
        assert_eq!(h.store.get(GRACE_UNTIL_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_custom_grace_period_is_honored() {
        let config = GateConfig {
            grace_period: Duration::from_secs(60),
            ..GateConfig::default()
        };
        let h = harness_config(false, config);

        let session = h.gate.begin_session();
        h.clock.advance(ChronoDuration::seconds(6));
        h.gate.dismiss(&session).await;
        assert!(h.gate.grace_active().await);

        h.clock.advance(ChronoDuration::seconds(61));
        assert!(!h.gate.grace_active().await);
    }

    fn broken_harness() -> (PaywallGate, Arc<MockClock>, Arc<CapturingErrors>) {
        let clock = Arc::new(MockClock::at("2025-06-01T10:00:00Z"));
        let errors = Arc::new(CapturingErrors::default());
        let tiers = Arc::new(TierResolver::new(
            Arc::new(FixedEntitlement(false)),
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
        ));
        let gate = PaywallGate::new(
            Arc::new(BrokenStore),
            tiers,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::new(CapturingAnalytics::default()),
            Arc::clone(&errors) as Arc<dyn ErrorSink>,
            GateConfig::default(),
        );
        (gate, clock, errors)
    }

    #[tokio::test]
    async fn test_storage_failure_never_suppresses() {
        let (gate, _clock, errors) = broken_harness();

        // An unreadable grace record must not hide the paywall.
        assert!(!gate.grace_active().await);
        assert!(gate.evaluate(Screen::Home).await.must_show());
        assert!(errors.messages.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failed_grace_write_dismisses_without_suppressing() {
        let (gate, clock, errors) = broken_harness();

        let session = gate.begin_session();
        clock.advance(ChronoDuration::seconds(6));

        // The dismissal stands even though nothing was persisted...
        assert!(matches!(
            gate.dismiss(&session).await,
            DismissOutcome::GraceStarted { .. }
        ));
        assert!(errors.exceptions.load(Ordering::SeqCst) >= 1);

        // ...so the next evaluation shows again instead of trusting a
        // grace period that never reached the store.
        assert!(!gate.grace_active().await);
        assert!(gate.evaluate(Screen::Home).await.must_show());
    }

    #[tokio::test]
    async fn test_show_emits_analytics_event() {
        let h = harness(false);
        h.gate.evaluate(Screen::Gallery).await;

        let events = h.analytics.events.lock().unwrap();
        let (name, props) = &events[0];
        assert_eq!(name, "paywall_shown");
        assert_eq!(props["screen"], "gallery");
        assert_eq!(props["forced"], false);
    }
}
