//! Per-provider pipeline: cache-or-fetch with ordered fallback.
//!
//! The executor consults the cache, then tries a provider's strategies in
//! their declared order. `Fail` moves on to the next strategy, `Fatal` stops
//! immediately. When nothing succeeds a stale cache entry is served in
//! preference to an outright failure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Duration as AgeDuration;
use meterbar_core::{CacheEntry, Freshness, ProviderKind, UsageSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::SnapshotCache;
use crate::context::FetchContext;
use crate::strategy::{FetchKind, FetchResult, FetchStrategy};

/// Source tag used for outcomes served from the cache.
pub const CACHE_SOURCE: &str = "cache";

/// Default freshness threshold.
pub const DEFAULT_FRESHNESS_MINUTES: i64 = 60;

/// Error reported when no strategy had what it needed to run.
pub const NO_USABLE_STRATEGY: &str = "no usable strategy";

/// Error reported when every strategy that ran failed recoverably.
pub const ALL_STRATEGIES_FAILED: &str = "all strategies failed";

/// Error reported when run-level cancellation abandoned the provider.
pub const FETCH_CANCELLED: &str = "fetch cancelled";

// ============================================================================
// Attempt
// ============================================================================

/// Classification of a single strategy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptClass {
    /// Strategy returned usable data.
    Ok,
    /// Recoverable failure.
    Fail,
    /// Unrecoverable failure.
    Fatal,
    /// Abandoned because the run was cancelled.
    Cancelled,
}

impl AttemptClass {
    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Fail => "fail",
            Self::Fatal => "fatal",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Record of a single strategy invocation.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// The strategy ID that was attempted.
    pub strategy: String,
    /// The kind of fetch used.
    pub kind: FetchKind,
    /// How long the attempt took.
    pub duration: Duration,
    /// How the attempt ended.
    pub classification: AttemptClass,
    /// Failure message, if any.
    pub message: Option<String>,
}

impl Attempt {
    fn new(
        strategy: &dyn FetchStrategy,
        classification: AttemptClass,
        message: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            strategy: strategy.id().to_string(),
            kind: strategy.kind(),
            duration,
            classification,
            message,
        }
    }
}

// ============================================================================
// Fetch Outcome
// ============================================================================

/// Final result for one provider in one run.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Provider the outcome belongs to.
    pub provider: ProviderKind,
    /// True if a snapshot is available (live or cached).
    pub success: bool,
    /// Usage data; always present when `success` is true.
    pub snapshot: Option<UsageSnapshot>,
    /// True if the snapshot came from the cache rather than a live fetch.
    pub cached: bool,
    /// Strategy label, or [`CACHE_SOURCE`].
    pub source: String,
    /// Strategies actually invoked, in order.
    pub attempts: Vec<Attempt>,
    /// Failure message when `success` is false.
    pub error: Option<String>,
    /// Age of the cached snapshot when `cached` is true.
    pub cache_age: Option<AgeDuration>,
    /// Set when a fresh snapshot could not be written to the cache.
    pub cache_warning: Option<String>,
    /// Wall time for the whole provider pipeline.
    pub duration: Duration,
}

impl FetchOutcome {
    /// Outcome for a live fetch.
    pub fn fetched(
        provider: ProviderKind,
        snapshot: UsageSnapshot,
        source: impl Into<String>,
        attempts: Vec<Attempt>,
    ) -> Self {
        Self {
            provider,
            success: true,
            snapshot: Some(snapshot),
            cached: false,
            source: source.into(),
            attempts,
            error: None,
            cache_age: None,
            cache_warning: None,
            duration: Duration::ZERO,
        }
    }

    /// Outcome served from a cache entry.
    pub fn from_cache(provider: ProviderKind, entry: CacheEntry, attempts: Vec<Attempt>) -> Self {
        let age = entry.age();
        Self {
            provider,
            success: true,
            snapshot: Some(entry.snapshot),
            cached: true,
            source: CACHE_SOURCE.to_string(),
            attempts,
            error: None,
            cache_age: Some(age),
            cache_warning: None,
            duration: Duration::ZERO,
        }
    }

    /// Failed outcome.
    pub fn failed(provider: ProviderKind, error: impl Into<String>, attempts: Vec<Attempt>) -> Self {
        Self {
            provider,
            success: false,
            snapshot: None,
            cached: false,
            source: String::new(),
            attempts,
            error: Some(error.into()),
            cache_age: None,
            cache_warning: None,
            duration: Duration::ZERO,
        }
    }

    fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns true if the last attempt was rejected for authentication.
    ///
    /// Holds for stale cached outcomes too, so callers can suggest
    /// re-authenticating even when old data is shown.
    pub fn needs_reauth(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.classification == AttemptClass::Fatal)
    }

    /// Returns true if the provider failed because nothing was configured.
    pub fn is_unconfigured(&self) -> bool {
        !self.success && self.error.as_deref() == Some(NO_USABLE_STRATEGY)
    }

    /// Returns true if the provider was abandoned by run cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.classification == AttemptClass::Cancelled)
    }

    /// Returns true if this is a cached outcome older than `threshold`.
    pub fn is_stale(&self, threshold: AgeDuration) -> bool {
        self.cached && self.cache_age.is_some_and(|age| age >= threshold)
    }
}

// ============================================================================
// Pipeline Executor
// ============================================================================

enum AttemptRun {
    Finished(FetchResult),
    TimedOut,
    Cancelled,
}

/// Drives one provider's cache-or-fetch decision.
///
/// Cheap to clone; the coordinator hands one clone to every provider task.
#[derive(Clone)]
pub struct PipelineExecutor {
    ctx: Arc<FetchContext>,
    cache: Arc<dyn SnapshotCache>,
    freshness_threshold: AgeDuration,
}

impl PipelineExecutor {
    /// Creates an executor with the default freshness threshold.
    pub fn new(ctx: Arc<FetchContext>, cache: Arc<dyn SnapshotCache>) -> Self {
        Self {
            ctx,
            cache,
            freshness_threshold: AgeDuration::minutes(DEFAULT_FRESHNESS_MINUTES),
        }
    }

    /// Sets the age below which a cached entry is served without fetching.
    pub fn with_freshness_threshold(mut self, threshold: AgeDuration) -> Self {
        self.freshness_threshold = threshold;
        self
    }

    /// Returns the shared fetch context.
    pub fn context(&self) -> &Arc<FetchContext> {
        &self.ctx
    }

    /// Returns the freshness threshold.
    pub fn freshness_threshold(&self) -> AgeDuration {
        self.freshness_threshold
    }

    /// Runs the pipeline for one provider.
    #[instrument(skip(self, strategies), fields(provider = %provider, strategies = strategies.len()))]
    pub async fn execute(
        &self,
        provider: ProviderKind,
        strategies: &[Arc<dyn FetchStrategy>],
        use_cache: bool,
    ) -> FetchOutcome {
        let start = Instant::now();
        self.run(provider, strategies, use_cache)
            .await
            .with_duration(start.elapsed())
    }

    async fn run(
        &self,
        provider: ProviderKind,
        strategies: &[Arc<dyn FetchStrategy>],
        use_cache: bool,
    ) -> FetchOutcome {
        let mut stale = None;
        if use_cache {
            if let Some(entry) = self.load_usable(provider).await {
                match Freshness::classify(Some(&entry), self.freshness_threshold) {
                    Freshness::Fresh => {
                        debug!(age_secs = entry.age().num_seconds(), "Serving fresh cache entry");
                        return FetchOutcome::from_cache(provider, entry, Vec::new());
                    }
                    Freshness::Stale => stale = Some(entry),
                    Freshness::Absent => {}
                }
            }
        }

        let mut attempts = Vec::new();
        let mut last_fatal: Option<String> = None;
        let mut any_fail = false;

        for strategy in strategies {
            let strategy = strategy.as_ref();

            if self.ctx.is_cancelled() {
                return FetchOutcome::failed(provider, FETCH_CANCELLED, attempts);
            }

            if !strategy.is_available(&self.ctx).await {
                debug!(strategy = %strategy.id(), "Strategy not available, skipping");
                continue;
            }

            debug!(strategy = %strategy.id(), kind = %strategy.kind(), "Executing strategy");
            let attempt_start = Instant::now();
            let run = self.run_attempt(strategy).await;
            let duration = attempt_start.elapsed();

            match run {
                AttemptRun::Cancelled => {
                    warn!(strategy = %strategy.id(), "Attempt abandoned by cancellation");
                    attempts.push(Attempt::new(
                        strategy,
                        AttemptClass::Cancelled,
                        Some("cancelled".to_string()),
                        duration,
                    ));
                    return FetchOutcome::failed(provider, FETCH_CANCELLED, attempts);
                }
                AttemptRun::TimedOut => {
                    let message = format!("timed out after {:?}", self.ctx.timeout());
                    warn!(strategy = %strategy.id(), "Strategy timed out");
                    attempts.push(Attempt::new(strategy, AttemptClass::Fail, Some(message), duration));
                    any_fail = true;
                }
                AttemptRun::Finished(FetchResult::Success(snapshot)) if !snapshot.has_data() => {
                    warn!(strategy = %strategy.id(), "Strategy returned no usage periods");
                    attempts.push(Attempt::new(
                        strategy,
                        AttemptClass::Fail,
                        Some("no usage periods in response".to_string()),
                        duration,
                    ));
                    any_fail = true;
                }
                AttemptRun::Finished(FetchResult::Success(mut snapshot)) => {
                    info!(strategy = %strategy.id(), duration = ?duration, "Strategy succeeded");
                    attempts.push(Attempt::new(strategy, AttemptClass::Ok, None, duration));

                    let label = strategy.label().to_string();
                    snapshot.provider = provider;
                    if snapshot.source.is_empty() {
                        snapshot.source.clone_from(&label);
                    }

                    let cache_warning = match self.cache.save(provider, &snapshot).await {
                        Ok(()) => None,
                        Err(e) => {
                            warn!(error = %e, "Failed to persist snapshot");
                            Some(e.to_string())
                        }
                    };

                    let mut outcome = FetchOutcome::fetched(provider, snapshot, label, attempts);
                    outcome.cache_warning = cache_warning;
                    return outcome;
                }
                AttemptRun::Finished(FetchResult::Fatal(message)) => {
                    warn!(strategy = %strategy.id(), error = %message, "Strategy failed fatally");
                    attempts.push(Attempt::new(
                        strategy,
                        AttemptClass::Fatal,
                        Some(message.clone()),
                        duration,
                    ));
                    last_fatal = Some(message);
                    break;
                }
                AttemptRun::Finished(FetchResult::Fail(message)) => {
                    warn!(strategy = %strategy.id(), error = %message, "Strategy failed");
                    attempts.push(Attempt::new(strategy, AttemptClass::Fail, Some(message), duration));
                    any_fail = true;
                }
            }
        }

        // A forced refresh that hit an authentication rejection must not be
        // masked by old data.
        let forced_fatal = !use_cache && last_fatal.is_some();
        if !forced_fatal {
            if !use_cache {
                stale = self.load_usable(provider).await;
            }
            if let Some(entry) = stale {
                warn!(age_secs = entry.age().num_seconds(), "All strategies failed, serving cached data");
                return FetchOutcome::from_cache(provider, entry, attempts);
            }
        }

        let error = match last_fatal {
            Some(message) => message,
            None if any_fail => ALL_STRATEGIES_FAILED.to_string(),
            None => NO_USABLE_STRATEGY.to_string(),
        };
        warn!(error = %error, "Provider fetch failed");
        FetchOutcome::failed(provider, error, attempts)
    }

    /// Invokes one strategy under the per-attempt timeout and run cancellation.
    async fn run_attempt(&self, strategy: &dyn FetchStrategy) -> AttemptRun {
        let timeout = self.ctx.timeout();
        tokio::select! {
            biased;
            () = self.ctx.cancel_token().cancelled() => AttemptRun::Cancelled,
            result = tokio::time::timeout(timeout, strategy.fetch(&self.ctx)) => match result {
                Ok(result) => AttemptRun::Finished(result),
                Err(_) => AttemptRun::TimedOut,
            },
        }
    }

    /// Loads the cache entry, treating empty snapshots as absent.
    async fn load_usable(&self, provider: ProviderKind) -> Option<CacheEntry> {
        self.cache
            .load(provider)
            .await
            .filter(|entry| entry.snapshot.has_data())
    }
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("ctx", &self.ctx)
            .field("freshness_threshold", &self.freshness_threshold)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
