// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `MeterBar` Core
//!
//! Core types and models shared by every `MeterBar` crate.
//!
//! This crate provides:
//!
//! - Domain models (providers, usage snapshots, periods, overage)
//! - The cache entry model and its freshness classification
//! - Path resolution for the configuration/cache/credential root
//! - Error types
//!
//! ## Key Types
//!
//! ### Provider Types
//! - [`ProviderKind`] - Enum of all supported providers
//!
//! ### Usage Types
//! - [`UsageSnapshot`] - One provider's usage at a point in time
//! - [`UsagePeriod`] - A single metered period (session, weekly, monthly...)
//! - [`Overage`] - Pay-as-you-go spend beyond the plan
//! - [`Identity`] - Account email and plan
//!
//! ### Cache
//! - [`CacheEntry`] - Persisted snapshot plus fetch timestamp
//! - [`Freshness`] - Fresh / stale / absent classification

pub mod error;
pub mod models;
pub mod paths;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Cache
    CacheEntry,
    Freshness,
    // Usage types
    Identity,
    Overage,
    PeriodType,
    // Provider types
    ProviderKind,
    UsagePeriod,
    UsageSnapshot,
};
