//! Providers command implementation.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use meterbar_fetch::{FetchContext, StrategyInfo};
use meterbar_providers::ProviderDescriptor;

use super::AppContext;
use crate::output::{JsonFormatter, ProviderInfoOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the providers command.
///
/// Lists every registered provider with its strategies in order. A strategy
/// is highlighted when its credential is currently present.
pub async fn run(cli: &Cli, app: &AppContext) -> Result<()> {
    let settings = app.settings.get().await;
    let ctx = FetchContext::builder()
        .credentials(Arc::new(app.credentials()))
        .build();

    let infos = join_all(app.registry.all().iter().map(|desc| strategy_infos(desc, &ctx))).await;

    match cli.format {
        OutputFormat::Json => {
            let outputs: Vec<ProviderInfoOutput> = app
                .registry
                .all()
                .iter()
                .zip(infos)
                .map(|(desc, strategies)| {
                    ProviderInfoOutput::new(desc, settings.is_provider_enabled(desc.id), strategies)
                })
                .collect();
            println!("{}", JsonFormatter::new(cli.pretty).format_providers(&outputs)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(cli.use_colors());
            println!("{}", formatter.format_providers_header());
            for (desc, strategies) in app.registry.all().iter().zip(&infos) {
                println!(
                    "{}",
                    formatter.format_provider_line(desc, settings.is_provider_enabled(desc.id), strategies)
                );
            }
        }
    }
    Ok(())
}

async fn strategy_infos(desc: &ProviderDescriptor, ctx: &FetchContext) -> Vec<StrategyInfo> {
    let strategies = desc.build_strategies();
    join_all(strategies.iter().map(|s| StrategyInfo::from_strategy(s.as_ref(), ctx))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterbar_providers::ProviderRegistry;

    #[tokio::test]
    async fn test_strategy_infos_follow_fetch_plan() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = FetchContext::builder()
            .credentials(Arc::new(
                meterbar_fetch::CredentialResolver::new()
                    .with_root(dir.path())
                    .with_home(dir.path())
                    .with_env_vars(std::collections::HashMap::new()),
            ))
            .build();
        let registry = ProviderRegistry::bootstrap();

        for desc in registry.all() {
            let infos = strategy_infos(desc, &ctx).await;
            let kinds: Vec<_> = infos.iter().map(|i| i.kind).collect();
            assert_eq!(kinds, desc.fetch_plan.source_kinds);
            assert!(infos.iter().all(|i| !i.available), "nothing configured in an empty root");
        }
    }
}
