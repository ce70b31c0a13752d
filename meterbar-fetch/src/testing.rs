//! Mock strategies and caches shared by the pipeline and coordinator tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use meterbar_core::{CacheEntry, PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};

use crate::cache::SnapshotCache;
use crate::context::FetchContext;
use crate::error::CacheError;
use crate::strategy::{FetchKind, FetchResult, FetchStrategy};

pub(crate) fn snapshot(provider: ProviderKind, utilization: f64) -> UsageSnapshot {
    UsageSnapshot::new(provider).with_period(UsagePeriod::from_percent(
        "Session",
        PeriodType::Session,
        utilization,
    ))
}

pub(crate) enum Behavior {
    Succeed(UsageSnapshot),
    Fail(&'static str),
    Fatal(&'static str),
    Hang,
}

pub(crate) struct MockStrategy {
    id: String,
    label: String,
    available: bool,
    delay: Duration,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl MockStrategy {
    pub(crate) fn new(id: &str, behavior: Behavior) -> Self {
        Self {
            id: id.to_string(),
            label: id.rsplit('.').next().unwrap_or(id).to_string(),
            available: true,
            delay: Duration::ZERO,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub(crate) fn shared(self) -> Arc<dyn FetchStrategy> {
        Arc::new(self)
    }
}

#[async_trait]
impl FetchStrategy for MockStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> FetchKind {
        FetchKind::OAuth
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn is_available(&self, _ctx: &FetchContext) -> bool {
        self.available
    }

    async fn fetch(&self, _ctx: &FetchContext) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behavior {
            Behavior::Succeed(snapshot) => FetchResult::Success(snapshot.clone()),
            Behavior::Fail(msg) => FetchResult::Fail((*msg).to_string()),
            Behavior::Fatal(msg) => FetchResult::Fatal((*msg).to_string()),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

/// Cache whose writes always fail and which never holds anything.
pub(crate) struct ReadOnlyCache;

#[async_trait]
impl SnapshotCache for ReadOnlyCache {
    async fn load(&self, _provider: ProviderKind) -> Option<CacheEntry> {
        None
    }

    async fn save(&self, _provider: ProviderKind, _snapshot: &UsageSnapshot) -> Result<(), CacheError> {
        Err(CacheError::Write("read-only filesystem".to_string()))
    }

    async fn clear(&self, _provider: Option<ProviderKind>) -> Result<(), CacheError> {
        Ok(())
    }
}
