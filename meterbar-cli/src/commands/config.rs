//! Config command - manage configuration.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand, ValueEnum};
use meterbar_core::paths;
use meterbar_store::Settings;
use tracing::info;

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config subcommand.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Enable a provider.
    Enable {
        /// Provider to enable.
        provider: String,
    },

    /// Disable a provider.
    Disable {
        /// Provider to disable.
        provider: String,
    },

    /// Change a numeric setting.
    Set {
        /// Setting to change.
        #[arg(value_enum)]
        key: SettingKey,
        /// New value (minutes for cache-threshold, seconds for timeout).
        value: u32,
    },

    /// Reset to defaults.
    Reset,
}

/// Settings that can be changed with `config set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingKey {
    /// Cache freshness threshold in minutes.
    CacheThreshold,
    /// Per-attempt timeout in seconds.
    Timeout,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, app: &AppContext) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, app).await,
        ConfigAction::Path => show_paths(cli, app),
        ConfigAction::Enable { provider } => set_enabled(provider, true, cli, app).await,
        ConfigAction::Disable { provider } => set_enabled(provider, false, cli, app).await,
        ConfigAction::Set { key, value } => set_value(*key, *value, cli, app).await,
        ConfigAction::Reset => reset_config(cli, app).await,
    }
}

async fn show_config(cli: &Cli, app: &AppContext) -> Result<()> {
    let settings = app.settings.get().await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(cli.use_colors());
            println!("{}", formatter.bold("MeterBar Configuration"));
            println!("{}", "─".repeat(40));
            println!();
            println!("Enabled providers:");
            if settings.enabled_providers.is_empty() {
                println!("  {}", formatter.dim("(none)"));
            }
            for provider in &settings.enabled_providers {
                println!("  • {}", provider.display_name());
            }
            println!();
            println!("Cache threshold: {} minutes", settings.cache_threshold_minutes);
            println!("Timeout:         {} seconds", settings.timeout_secs);
            println!();
            println!("{}", formatter.dim(&format!("Settings file: {}", app.settings.path().display())));
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&settings)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli, app: &AppContext) -> Result<()> {
    let root = &app.root;
    let settings_file = app.settings.path();
    let cache_dir = paths::cache_dir(root);
    let credentials_dir = paths::credentials_dir(root);

    match cli.format {
        OutputFormat::Text => {
            println!("Root:          {}", root.display());
            println!("Settings file: {}", settings_file.display());
            println!("Cache dir:     {}", cache_dir.display());
            println!("Credentials:   {}", credentials_dir.display());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "root": root.display().to_string(),
                "settingsFile": settings_file.display().to_string(),
                "cacheDir": cache_dir.display().to_string(),
                "credentialsDir": credentials_dir.display().to_string(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(())
}

async fn set_enabled(name: &str, enabled: bool, cli: &Cli, app: &AppContext) -> Result<()> {
    let desc = app.provider(name)?;

    app.settings
        .update(|settings| settings.set_provider_enabled(desc.id, enabled))
        .await;
    app.settings.save().await.context("Failed to save settings")?;

    let verb = if enabled { "Enabled" } else { "Disabled" };
    info!(provider = %desc.id, enabled, "Provider toggled");
    if !cli.quiet {
        println!("{verb}: {}", desc.display_name());
    }
    Ok(())
}

async fn set_value(key: SettingKey, value: u32, cli: &Cli, app: &AppContext) -> Result<()> {
    if value == 0 {
        bail!("Value must be greater than zero");
    }

    app.settings
        .update(|settings| match key {
            SettingKey::CacheThreshold => settings.cache_threshold_minutes = value,
            SettingKey::Timeout => settings.timeout_secs = u64::from(value),
        })
        .await;
    app.settings.save().await.context("Failed to save settings")?;

    if !cli.quiet {
        match key {
            SettingKey::CacheThreshold => println!("Cache threshold set to {value} minutes"),
            SettingKey::Timeout => println!("Timeout set to {value} seconds"),
        }
    }
    Ok(())
}

async fn reset_config(cli: &Cli, app: &AppContext) -> Result<()> {
    app.settings.update(|settings| *settings = Settings::default()).await;
    app.settings.save().await.context("Failed to save settings")?;

    if !cli.quiet {
        println!("Configuration reset to defaults");
    }
    Ok(())
}
