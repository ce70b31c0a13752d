// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # MeterBar Store
//!
//! Durable state for MeterBar.
//!
//! This crate provides:
//!
//! - **CacheStore**: Last successful snapshot per provider, implementing
//!   [`meterbar_fetch::SnapshotCache`]
//! - **SettingsStore**: User preferences with persistence
//! - **Persistence**: Atomic, owner-only JSON file helpers
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use meterbar_core::paths;
//! use meterbar_store::{CacheStore, SettingsStore};
//!
//! let root = paths::root_dir();
//! let settings = SettingsStore::load(paths::settings_file(&root)).await.get().await;
//! let cache = Arc::new(CacheStore::new(root));
//! let executor = PipelineExecutor::new(ctx, cache)
//!     .with_freshness_threshold(settings.freshness_threshold());
//! ```

pub mod cache_store;
pub mod error;
pub mod persistence;
pub mod settings_store;

pub use cache_store::CacheStore;
pub use error::StoreError;
pub use persistence::{ensure_dir, load_json, load_json_opt, load_json_or_default, remove_file, save_json};
pub use settings_store::{DEFAULT_CACHE_THRESHOLD_MINUTES, DEFAULT_TIMEOUT_SECS, Settings, SettingsStore};
