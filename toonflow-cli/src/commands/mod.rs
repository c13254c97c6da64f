//! CLI command implementations.

pub mod config;
pub mod generate;
pub mod paywall;
pub mod styles;
pub mod usage;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use toonflow_core::{
    AnalyticsSink, Clock, EntitlementProvider, ErrorSink, GenerationBackend, SystemClock,
};
use toonflow_fetch::{GenerationClient, HttpEntitlement};
use toonflow_quota::{
    GateConfig, GenerationOrchestrator, PaywallGate, TierResolver, TracingAnalytics,
    TracingErrorSink, UsageLedger,
};
use toonflow_store::{
    default_state_path, FileKvStore, Settings, StoredEntitlement, StoredSession,
};

/// Everything a command needs, wired over the on-disk state file and the
/// configured collaborators.
pub struct App {
    /// Loaded deployment settings.
    pub settings: Settings,
    /// The on-disk key-value state.
    pub store: Arc<FileKvStore>,
    /// Tier resolution.
    pub tiers: Arc<TierResolver>,
    /// The usage ledger.
    pub ledger: Arc<UsageLedger>,
    /// The paywall gate.
    pub gate: Arc<PaywallGate>,
}

impl App {
    /// Opens the default state file and wires the gating stack.
    pub async fn open() -> Result<Self> {
        let settings = Settings::load_default().await;
        let store = Arc::new(FileKvStore::open(default_state_path()).await);

        let analytics: Arc<dyn AnalyticsSink> = Arc::new(TracingAnalytics);
        let errors: Arc<dyn ErrorSink> = Arc::new(TracingErrorSink);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        // A configured entitlement endpoint wins; otherwise the flag in
        // local state stands in (flip it with `toonflow config entitle`).
        let entitlements: Arc<dyn EntitlementProvider> = match &settings.entitlement_url {
            Some(url) => {
                debug!(url, "Using HTTP entitlement check");
                Arc::new(HttpEntitlement::new(url)?)
            }
            None => Arc::new(StoredEntitlement::new(
                Arc::clone(&store) as Arc<dyn toonflow_core::KeyValueStore>
            )),
        };
        let tiers = Arc::new(TierResolver::new(entitlements, Arc::clone(&errors)));

        let ledger = Arc::new(UsageLedger::new(
            Arc::clone(&store) as Arc<dyn toonflow_core::KeyValueStore>,
            Arc::clone(&tiers),
            Arc::new(StoredSession::new(
                Arc::clone(&store) as Arc<dyn toonflow_core::KeyValueStore>
            )),
            Arc::clone(&clock),
            Arc::clone(&analytics),
            Arc::clone(&errors),
        ));

        let gate_config = GateConfig {
            grace_period: Duration::from_secs(settings.grace_minutes * 60),
            ..GateConfig::default()
        };
        let gate = Arc::new(PaywallGate::new(
            Arc::clone(&store) as Arc<dyn toonflow_core::KeyValueStore>,
            Arc::clone(&tiers),
            Arc::clone(&clock),
            Arc::clone(&analytics),
            Arc::clone(&errors),
            gate_config,
        ));

        Ok(Self {
            settings,
            store,
            tiers,
            ledger,
            gate,
        })
    }

    /// Builds the orchestrator over the configured generation service.
    pub fn orchestrator(&self) -> Result<GenerationOrchestrator> {
        let backend: Arc<dyn GenerationBackend> = Arc::new(GenerationClient::new(
            &self.settings.api_base_url,
            Duration::from_secs(self.settings.request_timeout_secs),
        )?);

        let orchestrator = GenerationOrchestrator::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.gate),
            Arc::clone(&self.tiers),
            backend,
            Arc::new(TracingAnalytics),
            Arc::new(TracingErrorSink),
        );
        Ok(if self.settings.paywall_on_limit {
            orchestrator
        } else {
            orchestrator.without_limit_paywall()
        })
    }
}
