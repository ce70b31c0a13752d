//! Filesystem locations for configuration, cache and credentials.
//!
//! Everything lives under one root directory so that `METERBAR_HOME` can
//! relocate the whole tool state (useful for tests and portable installs).
//!
//! - Linux: `~/.config/meterbar`
//! - macOS: `~/Library/Application Support/MeterBar`
//! - Windows: `%APPDATA%\MeterBar`

use std::path::{Path, PathBuf};

use crate::models::ProviderKind;

/// Environment variable that relocates the tool's root directory.
pub const HOME_ENV: &str = "METERBAR_HOME";

/// Returns the root directory, honouring [`HOME_ENV`].
pub fn root_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    default_root_dir()
}

/// Returns the platform default root directory.
pub fn default_root_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support").join("MeterBar"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .map(|c| c.join("meterbar"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Directory holding one cache file per provider.
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join("cache")
}

/// Cache file for a provider.
pub fn cache_file(root: &Path, provider: ProviderKind) -> PathBuf {
    cache_dir(root).join(format!("{}.json", provider.cli_name()))
}

/// Directory holding stored credential files.
pub fn credentials_dir(root: &Path) -> PathBuf {
    root.join("credentials")
}

/// Credential file for a provider and credential kind.
pub fn credential_file(root: &Path, provider: ProviderKind, kind: &str) -> PathBuf {
    credentials_dir(root).join(format!("{}-{kind}.json", provider.cli_name()))
}

/// Settings file.
pub fn settings_file(root: &Path) -> PathBuf {
    root.join("settings.json")
}
