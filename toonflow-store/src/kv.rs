//! Key-value store implementations.
//!
//! Two implementations of the [`KeyValueStore`] port: an in-memory map for
//! tests and ephemeral runs, and a file-backed JSON map for durable state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use toonflow_core::{CoreError, KeyValueStore};

use crate::persistence::{load_json_or_default, save_json};

// ============================================================================
// Memory Store
// ============================================================================

/// In-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    pub async fn len(&self) -> usize {
        self.map.read().await.len()
    }

    /// Returns true when no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.map.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.map.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.map
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.map.write().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// File Store
// ============================================================================

/// Durable key-value store backed by a single JSON file.
///
/// The whole map lives in memory and is rewritten on every mutation.
/// Mutations take an internal mutex so two concurrent writers cannot lose
/// updates to each other; reads go through the same map and see the last
/// committed write.
pub struct FileKvStore {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileKvStore {
    /// Opens the store at `path`, loading any existing contents.
    pub async fn open(path: PathBuf) -> Self {
        let map: HashMap<String, String> = load_json_or_default(&path).await;
        debug!(path = %path.display(), keys = map.len(), "Opened key-value store");
        Self {
            path,
            map: Mutex::new(map),
        }
    }

    /// Removes every key. Administrative full reset.
    pub async fn clear(&self) -> Result<(), CoreError> {
        let mut map = self.map.lock().await;
        map.clear();
        save_json(&self.path, &*map).await.map_err(CoreError::from)
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut map = self.map.lock().await;
        map.insert(key.to_string(), value.to_string());
        save_json(&self.path, &*map).await.map_err(CoreError::from)
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut map = self.map.lock().await;
        if map.remove(key).is_some() {
            save_json(&self.path, &*map).await.map_err(CoreError::from)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
