//! Core error types for `ToonFlow`.

use thiserror::Error;

/// Core error type for `ToonFlow` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Persistent key-value storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The entitlement provider could not be reached or answered badly.
    ///
    /// Callers must fail closed (treat the identity as free tier).
    #[error("Entitlement check failed: {0}")]
    Entitlement(String),

    /// The auth/session provider failed.
    #[error("Session error: {0}")]
    Session(String),

    /// The remote generation call failed.
    ///
    /// This is the single condition surfaced to the user for any transport
    /// failure, non-2xx response, or missing image payload.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Invalid data from an API response or the persistent store.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
