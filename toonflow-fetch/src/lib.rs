// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ToonFlow Fetch
//!
//! HTTP adapters for the ToonFlow gating engine:
//!
//! - [`HttpClient`] - thin reqwest wrapper with an explicit request timeout
//! - [`GenerationClient`] - [`GenerationBackend`] against the remote
//!   image-generation endpoint
//! - [`HttpEntitlement`] - [`EntitlementProvider`] against a subscription
//!   backend; fails closed on any error
//!
//! [`GenerationBackend`]: toonflow_core::GenerationBackend
//! [`EntitlementProvider`]: toonflow_core::EntitlementProvider

pub mod client;
pub mod entitlement;
pub mod error;
pub mod generation;

pub use client::HttpClient;
pub use entitlement::HttpEntitlement;
pub use error::FetchError;
pub use generation::GenerationClient;
