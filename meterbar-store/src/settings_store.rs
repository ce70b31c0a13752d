//! User preferences store.
//!
//! Settings live in `<root>/settings.json`. A missing or unreadable file
//! yields defaults; nothing is written until [`SettingsStore::save`].

use meterbar_core::{ProviderKind, paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{load_json, save_json};

/// Default cache freshness threshold, in minutes.
pub const DEFAULT_CACHE_THRESHOLD_MINUTES: u32 = 60;

/// Default per-attempt timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Providers fetched by default, in display order.
    pub enabled_providers: Vec<ProviderKind>,

    /// Cached data younger than this is served without fetching.
    pub cache_threshold_minutes: u32,

    /// Upper bound for one strategy attempt.
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled_providers: ProviderKind::all().to_vec(),
            cache_threshold_minutes: DEFAULT_CACHE_THRESHOLD_MINUTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Freshness threshold as a chrono duration.
    pub fn freshness_threshold(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cache_threshold_minutes))
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns true if the provider is enabled.
    pub fn is_provider_enabled(&self, provider: ProviderKind) -> bool {
        self.enabled_providers.contains(&provider)
    }

    /// Enables or disables a provider, keeping display order stable.
    pub fn set_provider_enabled(&mut self, provider: ProviderKind, enabled: bool) {
        if enabled {
            if !self.is_provider_enabled(provider) {
                self.enabled_providers.push(provider);
            }
        } else {
            self.enabled_providers.retain(|p| *p != provider);
        }
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` for a zero timeout.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.timeout_secs == 0 {
            return Err(StoreError::Config("timeout_secs must be greater than zero".to_string()));
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.enabled_providers.len());
        self.enabled_providers.retain(|p| {
            if seen.contains(p) {
                false
            } else {
                seen.push(*p);
                true
            }
        });
        self
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store with default settings at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
        }
    }

    /// Loads settings from a path, falling back to defaults.
    pub async fn load(path: PathBuf) -> Self {
        let settings = match load_json::<Settings>(&path).await {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded settings");
                settings.normalized()
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "Settings file not found, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        };

        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                warn!(error = %e, "Invalid settings, using defaults");
                Settings::default()
            }
        };

        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings in memory.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings are invalid or cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        settings.validate()?;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.cache_threshold_minutes, 60);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.freshness_threshold(), chrono::Duration::minutes(60));
        assert!(settings.is_provider_enabled(ProviderKind::Zai));
    }

    #[test]
    fn test_provider_toggle_keeps_order() {
        let mut settings = Settings::default();
        settings.set_provider_enabled(ProviderKind::Claude, false);
        assert!(!settings.is_provider_enabled(ProviderKind::Claude));

        settings.set_provider_enabled(ProviderKind::Claude, true);
        settings.set_provider_enabled(ProviderKind::Claude, true);
        assert_eq!(settings.enabled_providers.last(), Some(&ProviderKind::Claude));
        assert_eq!(settings.enabled_providers.len(), ProviderKind::all().len());
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::load(dir.path().join("settings.json")).await;
        assert_eq!(store.get().await, Settings::default());
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"enabled_providers":["zai","claude","zai"]}"#).unwrap();

        let settings = SettingsStore::load(path).await.get().await;
        assert_eq!(settings.enabled_providers, vec![ProviderKind::Zai, ProviderKind::Claude]);
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_invalid_settings_fall_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"timeout_secs":0}"#).unwrap();

        let settings = SettingsStore::load(path).await.get().await;
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn test_update_and_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone());

        store.update(|s| s.cache_threshold_minutes = 15).await;
        store.save().await.unwrap();

        let reloaded = SettingsStore::load(path).await.get().await;
        assert_eq!(reloaded.cache_threshold_minutes, 15);
    }
}
