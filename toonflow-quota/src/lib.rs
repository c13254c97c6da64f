// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ToonFlow Quota
//!
//! The gating engine of ToonFlow: decides, for a given identity and point
//! in time, whether a generation is permitted, how many remain, and when
//! the paywall must be shown versus suppressed.
//!
//! ## Components
//!
//! - [`TierResolver`] - single source of the subscription tier, with a
//!   short-lived cache and fail-safe fallback to the free tier
//! - [`UsageLedger`] - per-day generation counter with lazy calendar-day
//!   reset and serialized increments
//! - [`PaywallGate`] - paywall display decisions, grace periods after
//!   manual dismissal, hard/soft paywall phases
//! - [`StyleCatalog`] - static catalog of transformation styles
//! - [`GenerationOrchestrator`] - the per-action gatekeeper in front of the
//!   remote generation endpoint
//!
//! All external collaborators (storage, entitlements, identity, the
//! generation backend, telemetry, time) are injected through the port
//! traits in `toonflow-core`, so every decision path is testable without a
//! real backend.

pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod paywall;
pub mod styles;
pub mod telemetry;
pub mod tier;

pub use error::GenerateError;
pub use ledger::{UsageLedger, USAGE_COUNT_KEY, USAGE_DATE_KEY};
pub use orchestrator::{GenerationOrchestrator, GenerationResult};
pub use paywall::{
    DismissOutcome, GateConfig, PaywallDecision, PaywallGate, PaywallSession, Screen,
    SuppressReason, GRACE_UNTIL_KEY, PAYWALL_DISABLED_KEY, PAYWALL_SHOWN_DATE_KEY,
};
pub use styles::StyleCatalog;
pub use telemetry::{TracingAnalytics, TracingErrorSink};
pub use tier::TierResolver;
