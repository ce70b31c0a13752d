//! Where Claude credentials live.

use meterbar_core::ProviderKind;
use meterbar_fetch::{CliSession, CredentialKind, CredentialSpec, SessionFormat};

/// OAuth token written by the Claude CLI on login.
pub const OAUTH: CredentialSpec = CredentialSpec {
    provider: ProviderKind::Claude,
    kind: CredentialKind::OAuth,
    env_vars: &["CLAUDE_CODE_OAUTH_TOKEN"],
    stored_keys: &["access_token", "accessToken", "token"],
    cli_sessions: &[CliSession {
        path: ".claude/.credentials.json",
        format: SessionFormat::Json,
        key_path: &["claudeAiOauth", "accessToken"],
    }],
};

/// claude.ai browser session key.
pub const SESSION: CredentialSpec = CredentialSpec {
    provider: ProviderKind::Claude,
    kind: CredentialKind::Session,
    env_vars: &["CLAUDE_SESSION_KEY"],
    stored_keys: &["session_key", "sessionKey", "cookie"],
    cli_sessions: &[],
};

/// All Claude credential specs, in strategy order.
pub const ALL: &[CredentialSpec] = &[OAUTH, SESSION];
