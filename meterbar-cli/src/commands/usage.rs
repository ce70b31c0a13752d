//! Usage command implementation.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use meterbar_fetch::{FetchContext, FetchCoordinator, HttpClient, PipelineExecutor, RunResults, RunSummary};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the usage command.
#[derive(Args, Debug, Default)]
pub struct UsageArgs {
    /// Provider(s) to query: a name, comma-separated list, or "all".
    /// Defaults to the enabled providers from settings.
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Ignore fresh cache entries and fetch live.
    #[arg(long, short)]
    pub refresh: bool,

    /// Per-attempt timeout in seconds (overrides settings).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli, app: &AppContext) -> Result<ExitCode> {
    let settings = app.settings.get().await;
    let timeout = match args.timeout {
        Some(0) => bail!("--timeout must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => settings.timeout(),
    };
    let threshold = settings.freshness_threshold();

    let providers = app.select_providers(args.provider.as_deref()).await?;
    info!(providers = ?providers, refresh = args.refresh, "Fetching usage");

    let cancel = CancellationToken::new();
    let ctx = FetchContext::builder()
        .http(Arc::new(
            HttpClient::with_timeout(timeout).with_allowed_domains(app.registry.allowed_domains()),
        ))
        .credentials(Arc::new(app.credentials()))
        .timeout(timeout)
        .cancel_token(cancel.clone())
        .build();

    // Ctrl-C cancels in-flight strategies; the run still reports every provider.
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupt received, cancelling run");
                cancel.cancel();
            }
        }
    });

    let executor = PipelineExecutor::new(Arc::new(ctx), Arc::new(app.cache())).with_freshness_threshold(threshold);
    let coordinator = FetchCoordinator::new(executor);

    let text = TextFormatter::new(cli.use_colors()).with_attempts(cli.verbose);
    let show_progress = !cli.quiet && cli.format == OutputFormat::Text && providers.len() > 1;
    let plans = app.registry.plans(&providers);

    let results = coordinator
        .run_with_progress(plans, !args.refresh, |event| {
            if show_progress {
                eprintln!("{}", text.format_event(event));
            }
        })
        .await;
    watcher.abort();

    if show_progress {
        eprintln!();
    }
    print_results(&results, cli, app, &text, threshold)?;

    let summary = RunSummary::from_results(&results);
    debug!(summary = summary.label(), "Run finished");
    Ok(exit_code_for(summary))
}

fn print_results(
    results: &RunResults,
    cli: &Cli,
    app: &AppContext,
    text: &TextFormatter,
    threshold: chrono::Duration,
) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match cli.format {
        OutputFormat::Json => {
            writeln!(stdout, "{}", JsonFormatter::new(cli.pretty).format_results(results, threshold)?)?;
        }
        OutputFormat::Text => {
            let blocks: Vec<String> = results
                .values()
                .map(|outcome| text.format_outcome(outcome, app.registry.get(outcome.provider), threshold))
                .collect();
            writeln!(stdout, "{}", blocks.join("\n\n"))?;

            let succeeded = results.values().filter(|o| o.success).count();
            if let Some(footer) = text.format_summary(RunSummary::from_results(results), succeeded, results.len()) {
                writeln!(stdout, "\n{footer}")?;
            }
        }
    }
    Ok(())
}

/// Maps a run summary to the process exit code.
///
/// Partial failure still exits 0.
fn exit_code_for(summary: RunSummary) -> ExitCode {
    match summary {
        RunSummary::TotalFailure => ExitCode::TotalFailure,
        RunSummary::Empty | RunSummary::AllSucceeded | RunSummary::PartialFailure => ExitCode::Success,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use meterbar_core::{PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};
    use meterbar_fetch::SnapshotCache;
    use meterbar_providers::ProviderRegistry;
    use meterbar_store::CacheStore;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code_for(RunSummary::AllSucceeded), ExitCode::Success);
        assert_eq!(exit_code_for(RunSummary::PartialFailure), ExitCode::Success);
        assert_eq!(exit_code_for(RunSummary::Empty), ExitCode::Success);
        assert_eq!(exit_code_for(RunSummary::TotalFailure), ExitCode::TotalFailure);
    }

    #[tokio::test]
    async fn test_zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = AppContext::load(dir.path().to_path_buf(), ProviderRegistry::bootstrap()).await;
        let cli = Cli::try_parse_from(["meterbar", "--quiet"]).unwrap();
        let args = UsageArgs {
            timeout: Some(0),
            ..UsageArgs::default()
        };
        assert!(run(&args, &cli, &app).await.is_err());
    }

    #[tokio::test]
    async fn test_fresh_cache_is_served_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let snapshot = UsageSnapshot::new(ProviderKind::Zai)
            .with_source("api")
            .with_period(UsagePeriod::from_percent("Monthly", PeriodType::Monthly, 40.0));
        store.save(ProviderKind::Zai, &snapshot).await.unwrap();

        let app = AppContext::load(dir.path().to_path_buf(), ProviderRegistry::bootstrap()).await;
        let cli = Cli::try_parse_from(["meterbar", "--quiet", "--format", "json"]).unwrap();
        let args = UsageArgs {
            provider: Some("zai".to_string()),
            ..UsageArgs::default()
        };

        let code = run(&args, &cli, &app).await.unwrap();
        assert_eq!(code, ExitCode::Success);
    }
}
