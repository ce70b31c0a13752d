//! File-backed snapshot cache.
//!
//! One JSON file per provider under `<root>/cache/`, each holding the last
//! successful snapshot and when it was fetched. Entries are replaced
//! wholesale; a corrupt file reads as absent and is overwritten by the next
//! successful fetch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use meterbar_core::{CacheEntry, ProviderKind, UsageSnapshot, paths};
use meterbar_fetch::{CacheError, SnapshotCache};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::persistence::{load_json_opt, remove_file, save_json};

/// Persistent per-provider cache.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Creates a store rooted at `root` (the tool root, not the cache dir).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the cache files.
    pub fn dir(&self) -> PathBuf {
        paths::cache_dir(&self.root)
    }

    /// Cache file for a provider.
    pub fn path(&self, provider: ProviderKind) -> PathBuf {
        paths::cache_file(&self.root, provider)
    }

    /// Loads every readable entry, in provider order.
    pub async fn list(&self) -> Vec<CacheEntry> {
        let mut entries = Vec::new();
        for provider in ProviderKind::all() {
            if let Some(entry) = self.read(*provider).await {
                entries.push(entry);
            }
        }
        entries
    }

    /// Removes the entry for one provider, or all entries.
    ///
    /// Returns the number of files removed.
    #[instrument(skip(self))]
    pub async fn remove(&self, provider: Option<ProviderKind>) -> Result<usize, StoreError> {
        let targets: Vec<ProviderKind> = match provider {
            Some(p) => vec![p],
            None => ProviderKind::all().to_vec(),
        };

        let mut removed = 0;
        for provider in targets {
            if remove_file(&self.path(provider)).await? {
                debug!(provider = %provider, "Cache entry removed");
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn read(&self, provider: ProviderKind) -> Option<CacheEntry> {
        let entry: CacheEntry = load_json_opt(&self.path(provider)).await?;
        (entry.snapshot.provider == provider).then_some(entry)
    }

    async fn write(&self, provider: ProviderKind, snapshot: &UsageSnapshot) -> Result<(), StoreError> {
        let entry = CacheEntry::new(snapshot.clone());
        save_json(&self.path(provider), &entry).await
    }

    /// Returns the tool root this store lives under.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SnapshotCache for CacheStore {
    async fn load(&self, provider: ProviderKind) -> Option<CacheEntry> {
        self.read(provider).await
    }

    async fn save(&self, provider: ProviderKind, snapshot: &UsageSnapshot) -> Result<(), CacheError> {
        self.write(provider, snapshot)
            .await
            .map_err(|e| CacheError::Write(e.to_string()))
    }

    async fn clear(&self, provider: Option<ProviderKind>) -> Result<(), CacheError> {
        self.remove(provider)
            .await
            .map(|_| ())
            .map_err(|e| CacheError::Clear(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
