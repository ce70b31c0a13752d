//! CLI command implementations.

pub mod auth;
pub mod cache;
pub mod config;
pub mod providers;
pub mod usage;

use std::path::PathBuf;

use anyhow::{Result, bail};
use meterbar_core::{ProviderKind, paths};
use meterbar_fetch::CredentialResolver;
use meterbar_providers::{ProviderDescriptor, ProviderRegistry};
use meterbar_store::{CacheStore, SettingsStore};

// ============================================================================
// App Context
// ============================================================================

/// State shared by every command, built once per invocation.
pub struct AppContext {
    /// Configuration/cache/credential root.
    pub root: PathBuf,
    /// Known providers.
    pub registry: ProviderRegistry,
    /// Persisted settings.
    pub settings: SettingsStore,
}

impl AppContext {
    /// Loads the context from the default root (`METERBAR_HOME` aware).
    pub async fn load_default() -> Self {
        Self::load(paths::root_dir(), ProviderRegistry::bootstrap()).await
    }

    /// Loads the context from an explicit root.
    pub async fn load(root: PathBuf, registry: ProviderRegistry) -> Self {
        let settings = SettingsStore::load(paths::settings_file(&root)).await;
        Self {
            root,
            registry,
            settings,
        }
    }

    /// Credential resolver rooted at this context.
    pub fn credentials(&self) -> CredentialResolver {
        CredentialResolver::new().with_root(self.root.clone())
    }

    /// Cache store rooted at this context.
    pub fn cache(&self) -> CacheStore {
        CacheStore::new(self.root.clone())
    }

    /// Looks up a provider by CLI name or alias.
    pub fn provider(&self, name: &str) -> Result<&ProviderDescriptor> {
        match self.registry.by_cli_name(name.trim()) {
            Some(desc) => Ok(desc),
            None => bail!(
                "Unknown provider: {name} (known: {})",
                self.registry
                    .kinds()
                    .iter()
                    .map(|k| k.cli_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Resolves a `--provider` argument.
    ///
    /// `None` selects the enabled providers from settings, `all` selects
    /// every registered provider, anything else is a comma-separated list.
    pub async fn select_providers(&self, arg: Option<&str>) -> Result<Vec<ProviderKind>> {
        let enabled = self.settings.get().await.enabled_providers;
        parse_provider_selection(&self.registry, arg, &enabled)
    }
}

/// Parses a provider selection against a registry.
pub fn parse_provider_selection(
    registry: &ProviderRegistry,
    arg: Option<&str>,
    enabled: &[ProviderKind],
) -> Result<Vec<ProviderKind>> {
    match arg.map(str::to_lowercase).as_deref() {
        None | Some("default" | "enabled") => Ok(registry
            .kinds()
            .into_iter()
            .filter(|kind| enabled.contains(kind))
            .collect()),
        Some("all") => Ok(registry.kinds()),
        Some(names) => {
            let mut providers = Vec::new();
            for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                match registry.by_cli_name(name) {
                    Some(desc) if !providers.contains(&desc.id) => providers.push(desc.id),
                    Some(_) => {}
                    None => bail!("Unknown provider: {name}"),
                }
            }
            if providers.is_empty() {
                bail!("No valid providers specified");
            }
            Ok(providers)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::bootstrap()
    }

    #[test]
    fn test_parse_provider_default_uses_enabled() {
        let providers =
            parse_provider_selection(&registry(), None, &[ProviderKind::Zai, ProviderKind::Claude]).unwrap();
        assert_eq!(providers, vec![ProviderKind::Claude, ProviderKind::Zai]);
    }

    #[test]
    fn test_parse_provider_all() {
        let providers = parse_provider_selection(&registry(), Some("all"), &[]).unwrap();
        assert_eq!(providers.len(), registry().len());
    }

    #[test]
    fn test_parse_provider_single_alias() {
        let providers = parse_provider_selection(&registry(), Some("openai"), &[]).unwrap();
        assert_eq!(providers, vec![ProviderKind::Codex]);
    }

    #[test]
    fn test_parse_provider_comma_separated_dedups() {
        let providers = parse_provider_selection(&registry(), Some("codex, claude,codex"), &[]).unwrap();
        assert_eq!(providers, vec![ProviderKind::Codex, ProviderKind::Claude]);
    }

    #[test]
    fn test_parse_provider_unknown() {
        assert!(parse_provider_selection(&registry(), Some("codex,nope"), &[]).is_err());
        assert!(parse_provider_selection(&registry(), Some(" , "), &[]).is_err());
    }

    #[tokio::test]
    async fn test_app_context_reads_settings_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let app = AppContext::load(dir.path().to_path_buf(), registry()).await;
        assert_eq!(app.settings.path(), paths::settings_file(dir.path()));
        assert_eq!(app.cache().root(), dir.path());
        assert!(app.provider("gh").is_ok());
        assert!(app.provider("nope").is_err());
    }
}
