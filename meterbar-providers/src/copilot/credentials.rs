//! Where Copilot credentials live.

use meterbar_core::ProviderKind;
use meterbar_fetch::{CliSession, CredentialKind, CredentialSpec, SessionFormat};

/// GitHub token with Copilot access.
///
/// Falls back to the token the GitHub CLI keeps in `hosts.yml`.
pub const OAUTH: CredentialSpec = CredentialSpec {
    provider: ProviderKind::Copilot,
    kind: CredentialKind::OAuth,
    env_vars: &["COPILOT_API_TOKEN", "GITHUB_TOKEN"],
    stored_keys: &["token", "oauth_token", "access_token"],
    cli_sessions: &[CliSession {
        path: ".config/gh/hosts.yml",
        format: SessionFormat::Yaml,
        key_path: &["github.com", "oauth_token"],
    }],
};

/// All Copilot credential specs.
pub const ALL: &[CredentialSpec] = &[OAUTH];
