//! Key-value-backed collaborator stand-ins.
//!
//! Development and CLI builds run without the real subscription and auth
//! SDKs; these adapters satisfy the same ports from local state.

use async_trait::async_trait;
use std::sync::Arc;
use toonflow_core::{CoreError, EntitlementProvider, KeyValueStore, Session, SessionProvider};

/// Storage key for the locally stored entitlement flag.
pub const ENTITLED_KEY: &str = "toonflow_entitled";

/// Storage key for the locally stored user id.
pub const USER_ID_KEY: &str = "toonflow_user_id";

// ============================================================================
// Stored Entitlement
// ============================================================================

/// [`EntitlementProvider`] reading a boolean flag from local state.
pub struct StoredEntitlement {
    store: Arc<dyn KeyValueStore>,
}

impl StoredEntitlement {
    /// Creates the adapter over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EntitlementProvider for StoredEntitlement {
    async fn is_entitled(&self) -> Result<bool, CoreError> {
        let value = self.store.get(ENTITLED_KEY).await?;
        Ok(value.as_deref() == Some("true"))
    }
}

// ============================================================================
// Stored Session
// ============================================================================

/// [`SessionProvider`] reading the user id from local state.
///
/// Falls back to an anonymous session when no id has been stored, matching
/// the anonymous-identity flow of the auth collaborator.
pub struct StoredSession {
    store: Arc<dyn KeyValueStore>,
}

impl StoredSession {
    /// Creates the adapter over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionProvider for StoredSession {
    async fn current_session(&self) -> Result<Option<Session>, CoreError> {
        match self.store.get(USER_ID_KEY).await? {
            Some(user_id) => Ok(Some(Session {
                user_id,
                is_anonymous: false,
            })),
            None => Ok(Some(Session::anonymous("anonymous"))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
