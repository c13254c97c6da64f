// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ToonFlow Store
//!
//! Persistence adapters for the ToonFlow gating engine.
//!
//! This crate provides:
//!
//! - **MemoryKvStore**: in-process key-value store for tests and ephemeral
//!   runs
//! - **FileKvStore**: durable key-value store backed by a single JSON file,
//!   with writes serialized through an internal mutex
//! - **Settings**: user/deployment configuration with load/save helpers
//! - **Persistence**: JSON file I/O helpers with atomic writes
//! - **Flags**: key-value-backed stand-ins for the entitlement and session
//!   collaborators, used by the CLI and in development
//!
//! ## Usage
//!
//! ```ignore
//! use toonflow_store::{FileKvStore, Settings};
//!
//! let store = FileKvStore::open(toonflow_store::default_state_path()).await?;
//! store.set("toonflow_usage_count", "1").await?;
//!
//! let settings = Settings::load_default().await;
//! ```

pub mod error;
pub mod flags;
pub mod kv;
pub mod persistence;
pub mod settings;

pub use error::StoreError;
pub use flags::{StoredEntitlement, StoredSession, ENTITLED_KEY, USER_ID_KEY};
pub use kv::{FileKvStore, MemoryKvStore};
pub use persistence::{
    default_config_dir, default_settings_path, default_state_dir, default_state_path, load_json,
    load_json_or_default, save_json,
};
pub use settings::Settings;
