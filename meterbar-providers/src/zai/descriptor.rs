//! z.ai provider descriptor.

use std::sync::Arc;

use meterbar_core::ProviderKind;
use meterbar_fetch::{FetchKind, FetchStrategy};

use super::credentials;
use super::strategies::ZaiApiStrategy;
use crate::descriptor::{FetchPlan, ProviderDescriptor};

/// Creates the z.ai provider descriptor.
pub fn zai_descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(ProviderKind::Zai)
        .dashboard_url("https://z.ai/manage-apikey/subscription")
        .credentials(credentials::ALL)
        .fetch_plan(FetchPlan {
            source_kinds: &[FetchKind::ApiKey],
            build_strategies: build_zai_strategies,
        })
        .allowed_domains(&["api.z.ai"])
        .build()
}

fn build_zai_strategies() -> Vec<Arc<dyn FetchStrategy>> {
    vec![Arc::new(ZaiApiStrategy::new())]
}
