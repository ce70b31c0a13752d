// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! MeterBar CLI - AI assistant usage from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Show usage for enabled providers (cached results under an hour old are reused)
//! meterbar
//!
//! # Force a live fetch for two providers
//! meterbar usage --refresh --provider claude,codex
//!
//! # JSON output
//! meterbar --format json --pretty
//!
//! # Inspect or drop cached results
//! meterbar cache show
//! meterbar cache clear --provider zai
//!
//! # Credentials
//! meterbar auth status
//! meterbar auth set zai <api-key>
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{AppContext, auth, cache, config, providers, usage};

// ============================================================================
// CLI Definition
// ============================================================================

/// MeterBar CLI - unified usage report for AI assistant accounts.
#[derive(Parser)]
#[command(name = "meterbar")]
#[command(about = "Unified usage report for AI assistant accounts")]
#[command(long_about = r"
MeterBar fetches usage and quota data from several AI assistant accounts
and reports them together.

Supported providers:
  • Claude (claude)
  • OpenAI Codex (codex)
  • GitHub Copilot (copilot)
  • z.ai (zai)

Examples:
  meterbar                          # Enabled providers, cache allowed
  meterbar usage --refresh          # Ignore fresh cache entries
  meterbar usage --provider all     # All providers
  meterbar --format json            # JSON output
  meterbar auth status              # Where credentials were found
")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no progress or log output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch current usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Inspect or clear cached results.
    Cache(cache::CacheArgs),

    /// Manage provider credentials.
    Auth(auth::AuthArgs),

    /// List available providers.
    #[command(visible_alias = "p")]
    Providers,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Whether ANSI colors should be used for text output.
    pub fn use_colors(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none()
    }
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success, including runs where only some providers failed.
    Success = 0,
    /// The command itself failed.
    Error = 1,
    /// Every requested provider failed.
    TotalFailure = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    // "meterbar" prefixes every workspace crate target
    let filter = if verbose {
        EnvFilter::new("meterbar=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("meterbar=warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let code = match dispatch(&cli).await {
        Ok(code) => code,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::Error
        }
    };

    std::process::exit(code as i32);
}

async fn dispatch(cli: &Cli) -> Result<ExitCode> {
    let app = AppContext::load_default().await;

    match &cli.command {
        Some(Commands::Usage(args)) => usage::run(args, cli, &app).await,
        Some(Commands::Cache(args)) => cache::run(args, cli, &app).await.map(|()| ExitCode::Success),
        Some(Commands::Auth(args)) => auth::run(args, cli, &app).await.map(|()| ExitCode::Success),
        Some(Commands::Providers) => providers::run(cli, &app).await.map(|()| ExitCode::Success),
        Some(Commands::Config(args)) => config::run(args, cli, &app).await.map(|()| ExitCode::Success),
        None => usage::run(&usage::UsageArgs::default(), cli, &app).await,
    }
}
