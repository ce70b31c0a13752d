//! Credential lookup for provider strategies.
//!
//! Every provider credential is described by a static [`CredentialSpec`] and
//! resolved from three sources in fixed order:
//!
//! 1. **Environment** - the credential's variables, first non-empty wins
//! 2. **Stored file** - `<root>/credentials/<provider>-<kind>.json`
//! 3. **Provider CLI** - session files written by the provider's own tooling
//!
//! Reads never fail: a missing, unreadable or malformed source is treated as
//! absent and the next one is tried.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use meterbar_core::{ProviderKind, paths};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::error::CredentialError;

// ============================================================================
// Credential Spec
// ============================================================================

/// Kind of credential a strategy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Long-lived API key.
    ApiKey,
    /// OAuth access token.
    OAuth,
    /// Browser session cookie/key.
    Session,
}

impl CredentialKind {
    /// Returns the stable name used in file names and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::OAuth => "oauth",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File format of a provider CLI session file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFormat {
    /// JSON document.
    Json,
    /// YAML document (e.g. gh `hosts.yml`).
    Yaml,
}

/// Location of a credential inside a provider CLI's own session file.
#[derive(Debug, Clone, Copy)]
pub struct CliSession {
    /// Path relative to the user's home directory.
    pub path: &'static str,
    /// Document format.
    pub format: SessionFormat,
    /// Object keys leading to the secret string.
    pub key_path: &'static [&'static str],
}

/// Static description of where a provider credential can be found.
#[derive(Debug, Clone, Copy)]
pub struct CredentialSpec {
    /// Provider the credential belongs to.
    pub provider: ProviderKind,
    /// Credential kind; selects the stored file name.
    pub kind: CredentialKind,
    /// Environment variables, in preference order.
    pub env_vars: &'static [&'static str],
    /// Keys accepted in the stored file, in preference order.
    ///
    /// The first key is the one written by [`CredentialResolver::store`];
    /// later keys are legacy names still honoured on read.
    pub stored_keys: &'static [&'static str],
    /// Provider CLI session files, in preference order.
    pub cli_sessions: &'static [CliSession],
}

// ============================================================================
// Credential
// ============================================================================

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Environment variable.
    Env,
    /// Tool-managed credential file.
    Stored,
    /// Provider CLI session file.
    ProviderCli,
}

impl CredentialSource {
    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Stored => "stored",
            Self::ProviderCli => "provider-cli",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a presence check. Never carries the secret itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialProbe {
    /// Whether any source holds a usable credential.
    pub present: bool,
    /// The winning source, if present.
    pub source: Option<CredentialSource>,
}

impl CredentialProbe {
    fn absent() -> Self {
        Self {
            present: false,
            source: None,
        }
    }
}

/// A resolved credential.
#[derive(Clone)]
pub struct Credential {
    secret: String,
    /// Where it came from.
    pub source: CredentialSource,
    /// Env var name or file path it was read from.
    pub origin: String,
}

impl Credential {
    /// Returns the secret value.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &"[REDACTED]")
            .field("source", &self.source)
            .field("origin", &self.origin)
            .finish()
    }
}

// ============================================================================
// Resolver
// ============================================================================

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves credentials from environment, stored files and provider CLIs.
#[derive(Clone)]
pub struct CredentialResolver {
    root: PathBuf,
    home: Option<PathBuf>,
    env: EnvLookup,
}

impl CredentialResolver {
    /// Creates a resolver using the process environment, the tool root
    /// directory and the user's home directory.
    pub fn new() -> Self {
        Self {
            root: paths::root_dir(),
            home: dirs::home_dir(),
            env: Arc::new(|name: &str| std::env::var(name).ok()),
        }
    }

    /// Overrides the tool root directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Overrides the home directory used for provider CLI session files.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Replaces environment lookup with a fixed set of variables.
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Arc::new(move |name: &str| vars.get(name).cloned());
        self
    }

    /// Returns the tool root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the stored credential file for a spec.
    pub fn stored_path(&self, spec: &CredentialSpec) -> PathBuf {
        paths::credential_file(&self.root, spec.provider, spec.kind.as_str())
    }

    /// Reports whether a credential is present and where, without exposing it.
    pub async fn probe(&self, spec: &CredentialSpec) -> CredentialProbe {
        match self.load(spec).await {
            Some(credential) => CredentialProbe {
                present: true,
                source: Some(credential.source),
            },
            None => CredentialProbe::absent(),
        }
    }

    /// Loads the highest-precedence credential for a spec.
    #[instrument(skip(self, spec), fields(provider = %spec.provider, kind = %spec.kind))]
    pub async fn load(&self, spec: &CredentialSpec) -> Option<Credential> {
        let credential = match self.from_env(spec) {
            Some(credential) => Some(credential),
            None => match self.from_stored(spec).await {
                Some(credential) => Some(credential),
                None => self.from_cli(spec).await,
            },
        };

        match &credential {
            Some(c) => debug!(source = %c.source, "Credential resolved"),
            None => debug!("No credential found"),
        }
        credential
    }

    fn from_env(&self, spec: &CredentialSpec) -> Option<Credential> {
        spec.env_vars.iter().find_map(|name| {
            (self.env)(name)
                .and_then(non_empty)
                .map(|secret| Credential {
                    secret,
                    source: CredentialSource::Env,
                    origin: (*name).to_string(),
                })
        })
    }

    async fn from_stored(&self, spec: &CredentialSpec) -> Option<Credential> {
        let path = self.stored_path(spec);
        let doc = read_document(&path, SessionFormat::Json).await?;

        spec.stored_keys.iter().find_map(|key| {
            doc.get(*key)
                .and_then(Value::as_str)
                .and_then(|s| non_empty(s.to_string()))
                .map(|secret| Credential {
                    secret,
                    source: CredentialSource::Stored,
                    origin: path.display().to_string(),
                })
        })
    }

    async fn from_cli(&self, spec: &CredentialSpec) -> Option<Credential> {
        let home = self.home.as_ref()?;

        for session in spec.cli_sessions {
            let path = home.join(session.path);
            let Some(doc) = read_document(&path, session.format).await else {
                continue;
            };
            if let Some(secret) = lookup(&doc, session.key_path).and_then(non_empty) {
                return Some(Credential {
                    secret,
                    source: CredentialSource::ProviderCli,
                    origin: path.display().to_string(),
                });
            }
        }
        None
    }

    /// Writes a credential to the stored file with owner-only permissions.
    ///
    /// Creates the credentials directory if needed and replaces any previous
    /// value atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty or the file cannot be written.
    #[instrument(skip(self, spec, secret), fields(provider = %spec.provider, kind = %spec.kind))]
    pub async fn store(&self, spec: &CredentialSpec, secret: &str) -> Result<PathBuf, CredentialError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(CredentialError::Empty);
        }

        let key = spec.stored_keys.first().copied().unwrap_or("token");
        let mut doc = serde_json::Map::new();
        doc.insert(key.to_string(), Value::String(secret.to_string()));
        doc.insert("stored_at".to_string(), Value::String(Utc::now().to_rfc3339()));

        let path = self.stored_path(spec);
        write_private(&path, &serde_json::to_vec_pretty(&doc)?).await?;
        debug!(path = %path.display(), "Credential stored");
        Ok(path)
    }

    /// Removes the stored credential file. Returns false if none existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    #[instrument(skip(self, spec), fields(provider = %spec.provider, kind = %spec.kind))]
    pub async fn remove(&self, spec: &CredentialSpec) -> Result<bool, CredentialError> {
        let path = self.stored_path(spec);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Credential removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("root", &self.root)
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn read_document(path: &Path, format: SessionFormat) -> Option<Value> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable credential file");
            return None;
        }
    };

    let parsed = match format {
        SessionFormat::Json => serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()),
        SessionFormat::Yaml => serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string()),
    };

    parsed
        .map_err(|e| warn!(path = %path.display(), error = %e, "Malformed credential file"))
        .ok()
}

fn lookup(doc: &Value, key_path: &[&str]) -> Option<String> {
    key_path
        .iter()
        .try_fold(doc, |node, key| node.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Atomically writes `bytes` to `path`. On Unix the file is owner-only
/// from creation.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("json.tmp");
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(&tmp).await?;

    // A leftover temp file keeps its old mode; tighten it before writing.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
    }

    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SPEC: CredentialSpec = CredentialSpec {
        provider: ProviderKind::Claude,
        kind: CredentialKind::OAuth,
        env_vars: &["TEST_PRIMARY_TOKEN", "TEST_SECONDARY_TOKEN"],
        stored_keys: &["access_token", "accessToken"],
        cli_sessions: &[CliSession {
            path: ".tool/credentials.json",
            format: SessionFormat::Json,
            key_path: &["oauth", "accessToken"],
        }],
    };

    const YAML_SPEC: CredentialSpec = CredentialSpec {
        provider: ProviderKind::Copilot,
        kind: CredentialKind::OAuth,
        env_vars: &[],
        stored_keys: &["token"],
        cli_sessions: &[CliSession {
            path: ".config/gh/hosts.yml",
            format: SessionFormat::Yaml,
            key_path: &["github.com", "oauth_token"],
        }],
    };

    struct Fixture {
        root: TempDir,
        home: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                root: TempDir::new().unwrap(),
                home: TempDir::new().unwrap(),
            }
        }

        fn resolver(&self, env: &[(&str, &str)]) -> CredentialResolver {
            let vars = env.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
            CredentialResolver::new()
                .with_root(self.root.path())
                .with_home(self.home.path())
                .with_env_vars(vars)
        }

        fn write_home(&self, rel: &str, content: &str) {
            let path = self.home.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        fn write_stored(&self, spec: &CredentialSpec, content: &str) {
            let path = paths::credential_file(self.root.path(), spec.provider, spec.kind.as_str());
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }

    #[tokio::test]
    async fn test_absent_everywhere() {
        let fx = Fixture::new();
        let probe = fx.resolver(&[]).probe(&SPEC).await;
        assert!(!probe.present);
        assert_eq!(probe.source, None);
    }

    #[tokio::test]
    async fn test_env_wins_over_stored_and_cli() {
        let fx = Fixture::new();
        fx.write_stored(&SPEC, r#"{"access_token":"stored"}"#);
        fx.write_home(".tool/credentials.json", r#"{"oauth":{"accessToken":"cli"}}"#);

        let resolver = fx.resolver(&[("TEST_SECONDARY_TOKEN", "from-env")]);
        let credential = resolver.load(&SPEC).await.unwrap();
        assert_eq!(credential.secret(), "from-env");
        assert_eq!(credential.source, CredentialSource::Env);
        assert_eq!(credential.origin, "TEST_SECONDARY_TOKEN");
    }

    #[tokio::test]
    async fn test_stored_wins_over_cli() {
        let fx = Fixture::new();
        fx.write_stored(&SPEC, r#"{"access_token":"stored"}"#);
        fx.write_home(".tool/credentials.json", r#"{"oauth":{"accessToken":"cli"}}"#);

        let probe = fx.resolver(&[]).probe(&SPEC).await;
        assert_eq!(probe.source, Some(CredentialSource::Stored));
    }

    #[tokio::test]
    async fn test_cli_session_used_last() {
        let fx = Fixture::new();
        fx.write_home(".tool/credentials.json", r#"{"oauth":{"accessToken":"cli"}}"#);

        let credential = fx.resolver(&[]).load(&SPEC).await.unwrap();
        assert_eq!(credential.secret(), "cli");
        assert_eq!(credential.source, CredentialSource::ProviderCli);
    }

    #[tokio::test]
    async fn test_empty_env_is_skipped() {
        let fx = Fixture::new();
        fx.write_stored(&SPEC, r#"{"access_token":"stored"}"#);

        let resolver = fx.resolver(&[("TEST_PRIMARY_TOKEN", "   ")]);
        assert_eq!(resolver.probe(&SPEC).await.source, Some(CredentialSource::Stored));
    }

    #[tokio::test]
    async fn test_legacy_stored_key() {
        let fx = Fixture::new();
        fx.write_stored(&SPEC, r#"{"accessToken":"legacy"}"#);

        let credential = fx.resolver(&[]).load(&SPEC).await.unwrap();
        assert_eq!(credential.secret(), "legacy");
    }

    #[tokio::test]
    async fn test_malformed_stored_falls_through() {
        let fx = Fixture::new();
        fx.write_stored(&SPEC, "{not json");
        fx.write_home(".tool/credentials.json", r#"{"oauth":{"accessToken":"cli"}}"#);

        let probe = fx.resolver(&[]).probe(&SPEC).await;
        assert_eq!(probe.source, Some(CredentialSource::ProviderCli));
    }

    #[tokio::test]
    async fn test_yaml_session() {
        let fx = Fixture::new();
        fx.write_home(
            ".config/gh/hosts.yml",
            "github.com:\n    user: octocat\n    oauth_token: gho_abc\n",
        );

        let credential = fx.resolver(&[]).load(&YAML_SPEC).await.unwrap();
        assert_eq!(credential.secret(), "gho_abc");
    }

    #[tokio::test]
    async fn test_debug_is_redacted() {
        let fx = Fixture::new();
        let credential = fx.resolver(&[("TEST_PRIMARY_TOKEN", "sk-secret")]).load(&SPEC).await.unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let fx = Fixture::new();
        let resolver = fx.resolver(&[]);

        let path = resolver.store(&SPEC, "  new-token \n").await.unwrap();
        assert!(path.exists());
        assert_eq!(resolver.load(&SPEC).await.unwrap().secret(), "new-token");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(resolver.remove(&SPEC).await.unwrap());
        assert!(!resolver.probe(&SPEC).await.present);
        assert!(!resolver.remove(&SPEC).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_store_tightens_leftover_temp_file() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new();
        let resolver = fx.resolver(&[]);
        let path = resolver.stored_path(&SPEC);
        let tmp = path.with_extension("json.tmp");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&tmp, "stale").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        resolver.store(&SPEC, "fresh-token").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!tmp.exists());
        assert_eq!(resolver.load(&SPEC).await.unwrap().secret(), "fresh-token");
    }

    #[tokio::test]
    async fn test_store_rejects_empty() {
        let fx = Fixture::new();
        let result = fx.resolver(&[]).store(&SPEC, "   ").await;
        assert!(matches!(result, Err(CredentialError::Empty)));
    }
}
