//! Cache command implementation.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use meterbar_core::ProviderKind;

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the cache command.
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Cache subcommand.
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// List cached results with their age and freshness.
    Show {
        /// Only show this provider.
        #[arg(long, short)]
        provider: Option<String>,
    },
    /// Delete cached results.
    Clear {
        /// Only clear this provider.
        #[arg(long, short)]
        provider: Option<String>,
    },
}

/// Runs the cache command.
pub async fn run(args: &CacheArgs, cli: &Cli, app: &AppContext) -> Result<()> {
    match &args.command {
        CacheCommand::Show { provider } => show(provider.as_deref(), cli, app).await,
        CacheCommand::Clear { provider } => clear(provider.as_deref(), cli, app).await,
    }
}

fn resolve(app: &AppContext, provider: Option<&str>) -> Result<Option<ProviderKind>> {
    provider.map(|name| app.provider(name).map(|desc| desc.id)).transpose()
}

async fn show(provider: Option<&str>, cli: &Cli, app: &AppContext) -> Result<()> {
    let filter = resolve(app, provider)?;
    let threshold = app.settings.get().await.freshness_threshold();

    let entries: Vec<_> = app
        .cache()
        .list()
        .await
        .into_iter()
        .filter(|entry| filter.is_none_or(|kind| entry.snapshot.provider == kind))
        .collect();

    match cli.format {
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format_cache_entries(&entries, threshold)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(cli.use_colors());
            if entries.is_empty() {
                println!("{}", formatter.dim("No cached results."));
                return Ok(());
            }
            for entry in &entries {
                println!("{}", formatter.format_cache_entry(entry, threshold));
            }
            println!();
            println!(
                "{}",
                formatter.dim(&format!(
                    "Entries younger than {} minutes are served without fetching.",
                    threshold.num_minutes()
                ))
            );
        }
    }
    Ok(())
}

async fn clear(provider: Option<&str>, cli: &Cli, app: &AppContext) -> Result<()> {
    let filter = resolve(app, provider)?;
    let removed = app
        .cache()
        .remove(filter)
        .await
        .context("Failed to clear cache")?;

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "removed": removed });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                let noun = if removed == 1 { "entry" } else { "entries" };
                println!("Removed {removed} cache {noun}.");
            }
        }
    }
    Ok(())
}
