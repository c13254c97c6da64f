// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `ToonFlow` Core
//!
//! Core types, models, and port traits for the `ToonFlow` gating engine.
//!
//! This crate provides the foundational abstractions used across all other
//! `ToonFlow` crates, including:
//!
//! - Domain models (subscription tiers, usage records, styles, generation
//!   request/response shapes)
//! - Error types
//! - Port trait definitions for external collaborators (storage,
//!   entitlements, identity, generation backend, telemetry, clock)
//!
//! ## Key Types
//!
//! ### Quota Types
//! - [`SubscriptionTier`] - Free vs Pro, with the daily limit constants
//! - [`UsageRecord`] - Persisted per-day generation counter
//! - [`UsageReport`] - Count/limit view returned by ledger operations
//!
//! ### Style & Generation Types
//! - [`StyleEntry`] - Static catalog entry with a `requires_pro` flag
//! - [`GenerationRequest`] / [`GenerationResponse`] - Wire shapes for the
//!   remote generation endpoint
//! - [`GeneratedImage`] - Normalized successful output
//!
//! ### Ports
//! - [`KeyValueStore`] - Durable string key-value storage
//! - [`EntitlementProvider`] - "does this identity hold a paid entitlement?"
//! - [`SessionProvider`] - Current auth session, if any
//! - [`GenerationBackend`] - The remote transformation endpoint
//! - [`AnalyticsSink`] / [`ErrorSink`] - Fire-and-forget telemetry
//! - [`Clock`] - Injectable time source for temporal invariants

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Quota types
    SubscriptionTier,
    UsageRecord,
    UsageReport,
    FREE_DAILY_LIMIT,
    PRO_DAILY_LIMIT,
    // Identity
    Session,
    // Styles & generation
    GeneratedImage,
    GenerationRequest,
    GenerationResponse,
    StyleEntry,
    // Telemetry
    LogLevel,
};

// Re-export traits
pub use traits::{
    AnalyticsSink, Clock, EntitlementProvider, ErrorSink, GenerationBackend, KeyValueStore,
    SessionProvider, SystemClock,
};
