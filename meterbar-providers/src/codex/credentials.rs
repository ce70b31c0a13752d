//! Where Codex credentials live.
//!
//! The Codex CLI keeps its ChatGPT login in `~/.codex/auth.json`:
//!
//! ```json
//! { "tokens": { "access_token": "...", "id_token": "eyJ...", "account_id": "..." } }
//! ```

use meterbar_core::ProviderKind;
use meterbar_fetch::{CliSession, CredentialKind, CredentialSpec, SessionFormat};

const AUTH_FILE: &str = ".codex/auth.json";

/// ChatGPT access token.
pub const OAUTH: CredentialSpec = CredentialSpec {
    provider: ProviderKind::Codex,
    kind: CredentialKind::OAuth,
    env_vars: &["CODEX_ACCESS_TOKEN"],
    stored_keys: &["access_token", "token"],
    cli_sessions: &[CliSession {
        path: AUTH_FILE,
        format: SessionFormat::Json,
        key_path: &["tokens", "access_token"],
    }],
};

/// ID token carrying the account email and plan; only used for identity.
pub(crate) const ID_TOKEN: CredentialSpec = CredentialSpec {
    provider: ProviderKind::Codex,
    kind: CredentialKind::OAuth,
    env_vars: &[],
    stored_keys: &["id_token"],
    cli_sessions: &[CliSession {
        path: AUTH_FILE,
        format: SessionFormat::Json,
        key_path: &["tokens", "id_token"],
    }],
};

/// ChatGPT account id sent alongside the access token.
pub(crate) const ACCOUNT_ID: CredentialSpec = CredentialSpec {
    provider: ProviderKind::Codex,
    kind: CredentialKind::OAuth,
    env_vars: &["CODEX_ACCOUNT_ID"],
    stored_keys: &["account_id"],
    cli_sessions: &[CliSession {
        path: AUTH_FILE,
        format: SessionFormat::Json,
        key_path: &["tokens", "account_id"],
    }],
};

/// All user-facing Codex credential specs.
pub const ALL: &[CredentialSpec] = &[OAUTH];
