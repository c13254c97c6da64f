//! Port trait definitions for ToonFlow.
//!
//! External collaborators (storage, entitlements, identity, the generation
//! endpoint, telemetry, time) are reached exclusively through these traits,
//! so the gating logic can be tested without any real backend.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde_json::Value;

use crate::error::CoreError;
use crate::models::{GenerationRequest, GenerationResponse, LogLevel, Session};

// ============================================================================
// Storage
// ============================================================================

/// Durable, async string key-value storage.
///
/// The durable store for quota counters, grace-period timestamps, and
/// debug flags. Implementations must serialize writes to the same logical
/// key within a process to avoid lost updates.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value, returning `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Writes a value, creating or replacing the key.
    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Removes a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), CoreError>;
}

// ============================================================================
// Entitlements & Identity
// ============================================================================

/// Async query against the subscription/entitlement collaborator.
#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    /// Returns true when the current identity holds an active paid
    /// entitlement.
    ///
    /// Callers must fail closed: any `Err` is treated as "not entitled".
    async fn is_entitled(&self) -> Result<bool, CoreError>;
}

/// Access to the current auth session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the current session, or `None` when signed out.
    async fn current_session(&self) -> Result<Option<Session>, CoreError>;
}

// ============================================================================
// Generation
// ============================================================================

/// The remote image-generation endpoint.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Sends a transformation request and returns the raw response.
    ///
    /// Implementations must enforce a caller-visible timeout and map every
    /// failure mode (transport, non-2xx, malformed body) into
    /// [`CoreError::GenerationFailed`].
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResponse, CoreError>;
}

// ============================================================================
// Telemetry
// ============================================================================

/// Fire-and-forget analytics sink.
///
/// `track` must never fail into the caller; implementations swallow their
/// own errors.
pub trait AnalyticsSink: Send + Sync {
    /// Records an event with structured properties.
    fn track(&self, event: &str, properties: Value);
}

/// Fire-and-forget error-tracking sink.
pub trait ErrorSink: Send + Sync {
    /// Reports an exception with context.
    fn capture_exception(&self, message: &str, context: Value);

    /// Logs a message at the given severity with context.
    fn log_message(&self, message: &str, level: LogLevel, context: Value);
}

// ============================================================================
// Clock
// ============================================================================

/// Injectable time source.
///
/// Quota windows compare device-local calendar dates, not rolling 24-hour
/// windows; `today` is the single source of that date.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current device-local calendar date.
    fn today(&self) -> NaiveDate;

    /// The current instant as epoch milliseconds.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Real wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

// ============================================================================
// Tests
// ============================================================================
