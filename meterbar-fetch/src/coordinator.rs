//! Concurrent fan-out of provider pipelines.
//!
//! Every provider runs in its own task; strategies within a provider stay
//! sequential. Finished outcomes flow back over one channel whose single
//! consumer (the coordinator) forwards progress events, so callbacks never
//! run concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use meterbar_core::ProviderKind;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::pipeline::{FETCH_CANCELLED, FetchOutcome, PipelineExecutor};
use crate::strategy::FetchStrategy;

/// Ordered strategies per provider.
pub type ProviderPlans = BTreeMap<ProviderKind, Vec<Arc<dyn FetchStrategy>>>;

/// Joined results of one run.
pub type RunResults = BTreeMap<ProviderKind, FetchOutcome>;

// ============================================================================
// Completion Event
// ============================================================================

/// Progress record emitted once per provider as it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    /// Provider that finished.
    pub provider: ProviderKind,
    /// Source of the data (strategy label or "cache"); empty on failure.
    pub source: String,
    /// Time spent on the provider.
    pub duration: Duration,
    /// Whether data is available.
    pub success: bool,
    /// Whether the data came from the cache.
    pub cached: bool,
    /// Failure message.
    pub error: Option<String>,
}

impl From<&FetchOutcome> for CompletionEvent {
    fn from(outcome: &FetchOutcome) -> Self {
        Self {
            provider: outcome.provider,
            source: outcome.source.clone(),
            duration: outcome.duration,
            success: outcome.success,
            cached: outcome.cached,
            error: outcome.error.clone(),
        }
    }
}

// ============================================================================
// Run Summary
// ============================================================================

/// Aggregate status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSummary {
    /// No providers were requested.
    Empty,
    /// Every provider produced data.
    AllSucceeded,
    /// At least one provider failed, at least one succeeded.
    PartialFailure,
    /// Every provider failed.
    TotalFailure,
}

impl RunSummary {
    /// Classifies joined results.
    pub fn from_results(results: &RunResults) -> Self {
        let total = results.len();
        let succeeded = results.values().filter(|o| o.success).count();

        match (total, succeeded) {
            (0, _) => Self::Empty,
            (t, s) if s == t => Self::AllSucceeded,
            (_, 0) => Self::TotalFailure,
            _ => Self::PartialFailure,
        }
    }

    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::AllSucceeded => "all_succeeded",
            Self::PartialFailure => "partial_failure",
            Self::TotalFailure => "total_failure",
        }
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Runs many provider pipelines concurrently and joins their outcomes.
#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    executor: PipelineExecutor,
}

impl FetchCoordinator {
    /// Creates a coordinator around a pipeline executor.
    pub fn new(executor: PipelineExecutor) -> Self {
        Self { executor }
    }

    /// Returns the executor.
    pub fn executor(&self) -> &PipelineExecutor {
        &self.executor
    }

    /// Runs all plans and returns one outcome per provider.
    pub async fn run(&self, plans: ProviderPlans, use_cache: bool) -> RunResults {
        self.run_inner(plans, use_cache, &mut |_| {}).await
    }

    /// Like [`run`](Self::run), invoking `on_complete` as each provider
    /// finishes.
    ///
    /// The callback is invoked exactly once per provider, never concurrently.
    pub async fn run_with_progress<F>(&self, plans: ProviderPlans, use_cache: bool, mut on_complete: F) -> RunResults
    where
        F: FnMut(&CompletionEvent) + Send,
    {
        self.run_inner(plans, use_cache, &mut on_complete).await
    }

    #[instrument(skip_all, fields(providers = plans.len(), use_cache))]
    async fn run_inner(
        &self,
        plans: ProviderPlans,
        use_cache: bool,
        on_complete: &mut (dyn FnMut(&CompletionEvent) + Send),
    ) -> RunResults {
        let (tx, mut rx) = mpsc::unbounded_channel::<FetchOutcome>();
        let mut handles: Vec<(ProviderKind, JoinHandle<()>)> = Vec::with_capacity(plans.len());

        info!(count = plans.len(), "Starting provider fetches");

        for (provider, strategies) in plans {
            let executor = self.executor.clone();
            let tx = tx.clone();
            let handle = tokio::spawn(async move {
                let outcome = executor.execute(provider, &strategies, use_cache).await;
                // Receiver gone means the run was abandoned.
                let _ = tx.send(outcome);
            });
            handles.push((provider, handle));
        }
        drop(tx);

        let cancel = self.executor.context().cancel_token().clone();
        let mut results = RunResults::new();
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;
                received = rx.recv() => match received {
                    Some(outcome) => {
                        debug!(provider = %outcome.provider, success = outcome.success, "Provider finished");
                        on_complete(&CompletionEvent::from(&outcome));
                        results.insert(outcome.provider, outcome);
                    }
                    None => break,
                },
                () = cancel.cancelled() => {
                    warn!("Run cancelled, abandoning remaining providers");
                    cancelled = true;
                    break;
                }
            }
        }

        if cancelled {
            while let Ok(outcome) = rx.try_recv() {
                on_complete(&CompletionEvent::from(&outcome));
                results.insert(outcome.provider, outcome);
            }
        }

        for (provider, handle) in handles {
            if results.contains_key(&provider) {
                continue;
            }

            let error = if cancelled {
                handle.abort();
                FETCH_CANCELLED.to_string()
            } else {
                // The channel closed, so the task has already ended.
                match handle.await {
                    Err(e) if e.is_panic() => format!("fetch task panicked: {e}"),
                    Err(e) => format!("fetch task failed: {e}"),
                    Ok(()) => "fetch task ended without a result".to_string(),
                }
            };

            warn!(provider = %provider, error = %error, "Provider produced no outcome");
            let outcome = FetchOutcome::failed(provider, error, Vec::new());
            on_complete(&CompletionEvent::from(&outcome));
            results.insert(provider, outcome);
        }

        info!(summary = RunSummary::from_results(&results).label(), "Run finished");
        results
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::context::FetchContext;
    use crate::strategy::{FetchKind, FetchResult};
    use crate::testing::{Behavior, MockStrategy, snapshot};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::Instant;

    fn coordinator(ctx: FetchContext) -> FetchCoordinator {
        FetchCoordinator::new(PipelineExecutor::new(Arc::new(ctx), Arc::new(MemoryCache::new())))
    }

    fn plan(entries: Vec<(ProviderKind, MockStrategy)>) -> ProviderPlans {
        entries.into_iter().map(|(p, s)| (p, vec![s.shared()])).collect()
    }

    struct PanickingStrategy;

    #[async_trait]
    impl FetchStrategy for PanickingStrategy {
        fn id(&self) -> &str {
            "codex.panic"
        }

        fn kind(&self) -> FetchKind {
            FetchKind::OAuth
        }

        async fn is_available(&self, _ctx: &FetchContext) -> bool {
            true
        }

        async fn fetch(&self, _ctx: &FetchContext) -> FetchResult {
            panic!("parser blew up");
        }
    }

    #[tokio::test]
    async fn test_empty_plans() {
        let results = coordinator(FetchContext::new()).run(ProviderPlans::new(), true).await;
        assert!(results.is_empty());
        assert_eq!(RunSummary::from_results(&results), RunSummary::Empty);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_all_results() {
        let plans = plan(vec![
            (ProviderKind::Claude, MockStrategy::new("claude.oauth", Behavior::Succeed(snapshot(ProviderKind::Claude, 30.0)))),
            (ProviderKind::Codex, MockStrategy::new("codex.oauth", Behavior::Fail("down"))),
            (ProviderKind::Zai, MockStrategy::new("zai.api", Behavior::Succeed(snapshot(ProviderKind::Zai, 70.0)))),
        ]);

        let results = coordinator(FetchContext::new()).run(plans, true).await;

        assert_eq!(results.len(), 3);
        assert!(results[&ProviderKind::Claude].success);
        assert!(!results[&ProviderKind::Codex].success);
        assert!(results[&ProviderKind::Zai].success);
        assert_eq!(RunSummary::from_results(&results), RunSummary::PartialFailure);
    }

    #[tokio::test]
    async fn test_total_failure_summary() {
        let plans = plan(vec![
            (ProviderKind::Claude, MockStrategy::new("claude.oauth", Behavior::Fatal("expired"))),
            (ProviderKind::Codex, MockStrategy::new("codex.oauth", Behavior::Fail("down"))),
        ]);

        let results = coordinator(FetchContext::new()).run(plans, true).await;
        assert_eq!(RunSummary::from_results(&results), RunSummary::TotalFailure);
    }

    #[tokio::test]
    async fn test_providers_run_concurrently() {
        let delay = Duration::from_millis(300);
        let plans = plan(vec![
            (ProviderKind::Claude, MockStrategy::new("claude.oauth", Behavior::Succeed(snapshot(ProviderKind::Claude, 1.0))).with_delay(delay)),
            (ProviderKind::Codex, MockStrategy::new("codex.oauth", Behavior::Succeed(snapshot(ProviderKind::Codex, 1.0))).with_delay(delay)),
            (ProviderKind::Copilot, MockStrategy::new("copilot.api", Behavior::Succeed(snapshot(ProviderKind::Copilot, 1.0))).with_delay(delay)),
        ]);

        let start = Instant::now();
        let results = coordinator(FetchContext::new()).run(plans, true).await;

        assert_eq!(RunSummary::from_results(&results), RunSummary::AllSucceeded);
        assert!(start.elapsed() < delay * 3);
    }

    #[tokio::test]
    async fn test_callback_once_per_provider() {
        let plans = plan(vec![
            (ProviderKind::Claude, MockStrategy::new("claude.oauth", Behavior::Succeed(snapshot(ProviderKind::Claude, 10.0)))),
            (ProviderKind::Codex, MockStrategy::new("codex.oauth", Behavior::Fail("down"))),
            (ProviderKind::Zai, MockStrategy::new("zai.api", Behavior::Fatal("bad key"))),
        ]);

        let mut events = Vec::new();
        let results = coordinator(FetchContext::new())
            .run_with_progress(plans, true, |event| events.push(event.clone()))
            .await;

        assert_eq!(events.len(), 3);
        let seen: HashSet<_> = events.iter().map(|e| e.provider).collect();
        assert_eq!(seen.len(), 3);

        let claude = events.iter().find(|e| e.provider == ProviderKind::Claude).unwrap();
        assert!(claude.success);
        assert_eq!(claude.source, "oauth");

        let zai = events.iter().find(|e| e.provider == ProviderKind::Zai).unwrap();
        assert_eq!(zai.error.as_deref(), Some("bad key"));
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_failure() {
        let mut plans = ProviderPlans::new();
        plans.insert(ProviderKind::Codex, vec![Arc::new(PanickingStrategy) as Arc<dyn FetchStrategy>]);
        plans.insert(
            ProviderKind::Zai,
            vec![MockStrategy::new("zai.api", Behavior::Succeed(snapshot(ProviderKind::Zai, 5.0))).shared()],
        );

        let mut calls = 0;
        let results = coordinator(FetchContext::new())
            .run_with_progress(plans, true, |_| calls += 1)
            .await;

        assert_eq!(calls, 2);
        let codex = &results[&ProviderKind::Codex];
        assert!(!codex.success);
        assert!(codex.error.as_deref().unwrap().contains("panicked"));
        assert!(results[&ProviderKind::Zai].success);
    }

    #[tokio::test]
    async fn test_cancellation_does_not_hang() {
        let ctx = FetchContext::new();
        let token = ctx.cancel_token().clone();
        let plans = plan(vec![
            (ProviderKind::Claude, MockStrategy::new("claude.oauth", Behavior::Succeed(snapshot(ProviderKind::Claude, 10.0)))),
            (ProviderKind::Codex, MockStrategy::new("codex.oauth", Behavior::Hang)),
            (ProviderKind::Copilot, MockStrategy::new("copilot.api", Behavior::Hang)),
        ]);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let mut events = 0;
        let results = tokio::time::timeout(
            Duration::from_secs(5),
            coordinator(ctx).run_with_progress(plans, true, |_| events += 1),
        )
        .await
        .expect("coordinator hung after cancellation");

        assert_eq!(results.len(), 3);
        assert_eq!(events, 3);
        assert!(results[&ProviderKind::Claude].success);
        assert!(!results[&ProviderKind::Codex].success);
        assert_eq!(results[&ProviderKind::Copilot].error.as_deref(), Some("fetch cancelled"));
    }
}
