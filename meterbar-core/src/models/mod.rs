//! Domain models for `MeterBar`.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider kinds
//! - [`usage`] - Usage snapshot, periods, overage and identity
//! - [`cache`] - Cache entries and freshness

mod cache;
mod provider;
mod usage;

pub use cache::{CacheEntry, Freshness};
pub use provider::ProviderKind;
pub use usage::{Identity, Overage, PeriodType, UsagePeriod, UsageSnapshot};
#[cfg(test)]
mod serde_tests;
