// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # MeterBar Fetch
//!
//! Fetch orchestration for MeterBar: how one provider's usage is acquired,
//! and how many providers are acquired at once.
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//! - [`host::credentials`] - Credential resolution (env > stored file > provider CLI)
//!
//! ## Fetch Pipeline
//!
//! - [`strategy::FetchStrategy`] - One acquisition method for one provider
//! - [`pipeline::PipelineExecutor`] - Cache-or-fetch with ordered fallback
//! - [`coordinator::FetchCoordinator`] - Concurrent fan-out across providers
//! - [`cache::SnapshotCache`] - Cache seam implemented by `meterbar-store`
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use meterbar_fetch::{FetchContext, FetchCoordinator, MemoryCache, PipelineExecutor};
//!
//! let ctx = Arc::new(FetchContext::new());
//! let executor = PipelineExecutor::new(ctx, Arc::new(MemoryCache::new()));
//! let coordinator = FetchCoordinator::new(executor);
//!
//! let results = coordinator
//!     .run_with_progress(plans, true, |event| println!("{} done", event.provider))
//!     .await;
//! ```

pub mod cache;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod strategy;

#[cfg(test)]
mod testing;

// Errors
pub use error::{CacheError, CredentialError, FetchError, HttpError};

// Host APIs
pub use host::{
    credentials::{
        CliSession, Credential, CredentialKind, CredentialProbe, CredentialResolver, CredentialSource,
        CredentialSpec, SessionFormat,
    },
    http::HttpClient,
};

// Strategy, pipeline & coordinator
pub use cache::{MemoryCache, SnapshotCache};
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use coordinator::{CompletionEvent, FetchCoordinator, ProviderPlans, RunResults, RunSummary};
pub use pipeline::{
    ALL_STRATEGIES_FAILED, Attempt, AttemptClass, CACHE_SOURCE, FETCH_CANCELLED, FetchOutcome, NO_USABLE_STRATEGY,
    PipelineExecutor,
};
pub use strategy::{FetchKind, FetchResult, FetchStrategy, StrategyInfo};
