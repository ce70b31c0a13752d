//! Snapshot cache seam used by the pipeline.
//!
//! The durable, file-backed implementation lives in `meterbar-store`; this
//! crate only needs to load and save per-provider entries.

use std::collections::HashMap;

use async_trait::async_trait;
use meterbar_core::{CacheEntry, ProviderKind, UsageSnapshot};
use tokio::sync::RwLock;

use crate::error::CacheError;

/// Persistent store of the last successful snapshot per provider.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Loads the entry for a provider.
    ///
    /// Missing, unreadable and corrupt entries all return `None`.
    async fn load(&self, provider: ProviderKind) -> Option<CacheEntry>;

    /// Replaces the entry for a provider with `snapshot`, stamped now.
    async fn save(&self, provider: ProviderKind, snapshot: &UsageSnapshot) -> Result<(), CacheError>;

    /// Removes the entry for one provider, or all entries when `None`.
    async fn clear(&self, provider: Option<ProviderKind>) -> Result<(), CacheError>;
}

/// Process-local cache, used when persistence is disabled and in tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<ProviderKind, CacheEntry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry directly, e.g. with a back-dated timestamp.
    pub async fn insert(&self, entry: CacheEntry) {
        self.entries.write().await.insert(entry.snapshot.provider, entry);
    }
}

#[async_trait]
impl SnapshotCache for MemoryCache {
    async fn load(&self, provider: ProviderKind) -> Option<CacheEntry> {
        self.entries.read().await.get(&provider).cloned()
    }

    async fn save(&self, provider: ProviderKind, snapshot: &UsageSnapshot) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert(provider, CacheEntry::new(snapshot.clone()));
        Ok(())
    }

    async fn clear(&self, provider: Option<ProviderKind>) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        match provider {
            Some(provider) => {
                entries.remove(&provider);
            }
            None => entries.clear(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterbar_core::{PeriodType, UsagePeriod};

    #[tokio::test]
    async fn test_save_load_clear() {
        let cache = MemoryCache::new();
        let snapshot = UsageSnapshot::new(ProviderKind::Zai)
            .with_period(UsagePeriod::from_percent("Monthly", PeriodType::Monthly, 12.0));

        cache.save(ProviderKind::Zai, &snapshot).await.unwrap();
        let entry = cache.load(ProviderKind::Zai).await.unwrap();
        assert_eq!(entry.snapshot, snapshot);
        assert!(cache.load(ProviderKind::Claude).await.is_none());

        cache.clear(Some(ProviderKind::Zai)).await.unwrap();
        assert!(cache.load(ProviderKind::Zai).await.is_none());
    }
}
