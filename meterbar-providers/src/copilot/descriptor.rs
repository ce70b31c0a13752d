//! Copilot provider descriptor.

use std::sync::Arc;

use meterbar_core::ProviderKind;
use meterbar_fetch::{FetchKind, FetchStrategy};

use super::credentials;
use super::strategies::CopilotApiStrategy;
use crate::descriptor::{FetchPlan, ProviderDescriptor};

/// Creates the Copilot provider descriptor.
pub fn copilot_descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(ProviderKind::Copilot)
        .dashboard_url("https://github.com/settings/copilot")
        .credentials(credentials::ALL)
        .fetch_plan(FetchPlan {
            source_kinds: &[FetchKind::OAuth],
            build_strategies: build_copilot_strategies,
        })
        .allowed_domains(&["api.github.com"])
        .build()
}

fn build_copilot_strategies() -> Vec<Arc<dyn FetchStrategy>> {
    vec![Arc::new(CopilotApiStrategy::new())]
}
