//! Claude provider descriptor.

use std::sync::Arc;

use meterbar_core::ProviderKind;
use meterbar_fetch::{FetchKind, FetchStrategy};

use super::credentials;
use super::strategies::{ClaudeOAuthStrategy, ClaudeWebStrategy};
use crate::descriptor::{FetchPlan, ProviderDescriptor};

/// Creates the Claude provider descriptor.
pub fn claude_descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(ProviderKind::Claude)
        .dashboard_url("https://claude.ai/settings/usage")
        .credentials(credentials::ALL)
        .fetch_plan(FetchPlan {
            source_kinds: &[FetchKind::OAuth, FetchKind::WebSession],
            build_strategies: build_claude_strategies,
        })
        .allowed_domains(&["api.anthropic.com", "claude.ai"])
        .build()
}

/// OAuth first; the web session is the fallback.
fn build_claude_strategies() -> Vec<Arc<dyn FetchStrategy>> {
    vec![
        Arc::new(ClaudeOAuthStrategy::new()),
        Arc::new(ClaudeWebStrategy::new()),
    ]
}
