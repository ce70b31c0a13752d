//! Auth command implementation.
//!
//! Credentials stored here land in `<root>/credentials/<provider>-<kind>.json`
//! and are picked up by the fetch pipeline after environment variables.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand, ValueEnum};
use futures::future::join_all;
use meterbar_core::ProviderKind;
use meterbar_fetch::{CredentialKind, CredentialSpec};
use meterbar_providers::ProviderDescriptor;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, warn};

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Auth subcommand.
    #[command(subcommand)]
    pub command: AuthCommand,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Show which credentials are present and where they come from.
    Status {
        /// Only show this provider.
        #[arg(long, short)]
        provider: Option<String>,
    },
    /// Store a credential for a provider.
    Set {
        /// Provider name.
        provider: String,
        /// Secret value, or "-" to read it from stdin.
        secret: String,
        /// Credential kind (defaults to the provider's primary kind).
        #[arg(long, short, value_enum)]
        kind: Option<KindArg>,
    },
    /// Remove stored credentials for a provider.
    Remove {
        /// Provider name.
        provider: String,
        /// Only remove this kind (defaults to all kinds).
        #[arg(long, short, value_enum)]
        kind: Option<KindArg>,
    },
}

/// Credential kind as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Long-lived API key.
    ApiKey,
    /// OAuth access token.
    Oauth,
    /// Browser session key.
    Session,
}

impl From<KindArg> for CredentialKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::ApiKey => Self::ApiKey,
            KindArg::Oauth => Self::OAuth,
            KindArg::Session => Self::Session,
        }
    }
}

/// Runs the auth command.
pub async fn run(args: &AuthArgs, cli: &Cli, app: &AppContext) -> Result<()> {
    match &args.command {
        AuthCommand::Status { provider } => status(provider.as_deref(), cli, app).await,
        AuthCommand::Set { provider, secret, kind } => {
            let secret = if secret == "-" {
                read_secret_from_stdin().await?
            } else {
                secret.clone()
            };
            set(provider, &secret, *kind, cli, app).await
        }
        AuthCommand::Remove { provider, kind } => remove(provider, *kind, cli, app).await,
    }
}

// ============================================================================
// Status
// ============================================================================

async fn status(provider: Option<&str>, cli: &Cli, app: &AppContext) -> Result<()> {
    let descriptors: Vec<&ProviderDescriptor> = match provider {
        Some(name) => vec![app.provider(name)?],
        None => app.registry.all().iter().collect(),
    };

    let resolver = app.credentials();
    let pairs: Vec<_> = descriptors
        .iter()
        .flat_map(|desc| desc.credentials.iter().map(move |spec| (*desc, spec)))
        .collect();
    let probes = join_all(pairs.iter().map(|(_, spec)| resolver.probe(spec))).await;
    let checks: Vec<_> = pairs
        .into_iter()
        .zip(probes)
        .map(|((desc, spec), probe)| (desc, spec, probe))
        .collect();

    match cli.format {
        OutputFormat::Json => println!("{}", JsonFormatter::new(cli.pretty).format_credentials(&checks)?),
        OutputFormat::Text => {
            let formatter = TextFormatter::new(cli.use_colors());
            for (desc, spec, probe) in &checks {
                println!("{}", formatter.format_credential(desc.display_name(), spec, *probe));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Set / Remove
// ============================================================================

fn select_spec(desc: &ProviderDescriptor, kind: Option<KindArg>) -> Result<&'static CredentialSpec> {
    let spec = match kind {
        Some(kind) => desc.credential(kind.into()),
        None => desc.credentials.first(),
    };
    match spec {
        Some(spec) => Ok(spec),
        None => {
            let kinds: Vec<&str> = desc.credentials.iter().map(|s| s.kind.as_str()).collect();
            bail!(
                "{} does not accept that credential kind (accepted: {})",
                desc.display_name(),
                kinds.join(", ")
            )
        }
    }
}

async fn set(provider: &str, secret: &str, kind: Option<KindArg>, cli: &Cli, app: &AppContext) -> Result<()> {
    let desc = app.provider(provider)?;
    let spec = select_spec(desc, kind)?;

    let path = app
        .credentials()
        .store(spec, secret)
        .await
        .with_context(|| format!("Failed to store {} credential for {}", spec.kind, desc.display_name()))?;
    invalidate_cache(app, desc.id).await;

    if !cli.quiet {
        println!("Stored {} credential for {} at {}", spec.kind, desc.display_name(), path.display());
        if let Some(env) = spec.env_vars.first() {
            let formatter = TextFormatter::new(cli.use_colors());
            println!("{}", formatter.dim(&format!("Note: {env} takes precedence when set.")));
        }
    }
    Ok(())
}

async fn remove(provider: &str, kind: Option<KindArg>, cli: &Cli, app: &AppContext) -> Result<()> {
    let desc = app.provider(provider)?;
    let specs: Vec<&CredentialSpec> = match kind {
        Some(_) => vec![select_spec(desc, kind)?],
        None => desc.credentials.iter().collect(),
    };

    let resolver = app.credentials();
    let mut removed = 0;
    for spec in specs {
        if resolver
            .remove(spec)
            .await
            .with_context(|| format!("Failed to remove {} credential", spec.kind))?
        {
            removed += 1;
        }
    }
    invalidate_cache(app, desc.id).await;

    if !cli.quiet {
        if removed == 0 {
            println!("No stored credentials for {}.", desc.display_name());
        } else {
            println!("Removed {removed} stored credential(s) for {}.", desc.display_name());
        }
    }
    Ok(())
}

/// Drops the provider's cached result so the next run uses the new credential.
async fn invalidate_cache(app: &AppContext, provider: ProviderKind) {
    match app.cache().remove(Some(provider)).await {
        Ok(n) => debug!(provider = %provider, removed = n, "Cache invalidated after credential change"),
        Err(e) => warn!(provider = %provider, error = %e, "Failed to invalidate cache"),
    }
}

async fn read_secret_from_stdin() -> Result<String> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let line = lines.next_line().await.context("Failed to read secret from stdin")?;
    match line.map(|l| l.trim().to_string()) {
        Some(secret) if !secret.is_empty() => Ok(secret),
        _ => bail!("No secret provided on stdin"),
    }
}

// ============================================================================
// Tests
// ============================================================================
