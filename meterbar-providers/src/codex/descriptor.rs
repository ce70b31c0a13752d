//! Codex provider descriptor.

use std::sync::Arc;

use meterbar_core::ProviderKind;
use meterbar_fetch::{FetchKind, FetchStrategy};

use super::credentials;
use super::strategies::CodexOAuthStrategy;
use crate::descriptor::{FetchPlan, ProviderDescriptor};

/// Creates the Codex provider descriptor.
pub fn codex_descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(ProviderKind::Codex)
        .dashboard_url("https://chatgpt.com/codex/settings/usage")
        .credentials(credentials::ALL)
        .fetch_plan(FetchPlan {
            source_kinds: &[FetchKind::OAuth],
            build_strategies: build_codex_strategies,
        })
        .allowed_domains(&["chatgpt.com"])
        .build()
}

fn build_codex_strategies() -> Vec<Arc<dyn FetchStrategy>> {
    vec![Arc::new(CodexOAuthStrategy::new())]
}
