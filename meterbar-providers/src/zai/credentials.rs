//! Where z.ai credentials live.

use meterbar_core::ProviderKind;
use meterbar_fetch::{CredentialKind, CredentialSpec};

/// z.ai API key. There is no first-party CLI session to fall back to.
pub const API_KEY: CredentialSpec = CredentialSpec {
    provider: ProviderKind::Zai,
    kind: CredentialKind::ApiKey,
    env_vars: &["ZAI_API_KEY", "ZAI_API_TOKEN"],
    stored_keys: &["api_key", "apiKey", "token"],
    cli_sessions: &[],
};

/// All z.ai credential specs.
pub const ALL: &[CredentialSpec] = &[API_KEY];
