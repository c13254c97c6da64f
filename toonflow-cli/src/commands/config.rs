//! Config command - manage settings and local state.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use toonflow_store::{default_config_dir, default_settings_path, default_state_path, ENTITLED_KEY};

use crate::commands::App;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration and state paths.
    Path,

    /// Set a settings field.
    Set {
        /// Field name: api-base-url, entitlement-url, timeout, grace-minutes,
        /// paywall-on-limit.
        key: String,
        /// New value.
        value: String,
    },

    /// Flip the local entitlement flag (development stand-in for a
    /// subscription).
    Entitle {
        /// "on" or "off".
        state: String,
    },

    /// Clear today's usage counter.
    ResetUsage,

    /// Reset settings to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Set { key, value } => set_field(key, value).await,
        ConfigAction::Entitle { state } => set_entitled(state).await,
        ConfigAction::ResetUsage => reset_usage().await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let app = App::open().await?;
    let settings = &app.settings;

    match cli.format {
        OutputFormat::Text => {
            println!("ToonFlow Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API base URL:     {}", settings.api_base_url);
            println!(
                "Entitlement URL:  {}",
                settings.entitlement_url.as_deref().unwrap_or("(local flag)")
            );
            println!("Request timeout:  {}s", settings.request_timeout_secs);
            println!("Grace period:     {} minutes", settings.grace_minutes);
            println!("Paywall on limit: {}", settings.paywall_on_limit);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(settings)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();
    let state_path = default_state_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("State file:    {}", state_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
                "state_file": state_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_field(key: &str, value: &str) -> Result<()> {
    let mut settings = toonflow_store::Settings::load_default().await;

    match key {
        "api-base-url" => settings.api_base_url = value.to_string(),
        "entitlement-url" => {
            settings.entitlement_url = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "timeout" => settings.request_timeout_secs = value.parse()?,
        "grace-minutes" => settings.grace_minutes = value.parse()?,
        "paywall-on-limit" => settings.paywall_on_limit = value.parse()?,
        _ => anyhow::bail!(
            "Unknown field: {key}. Use: api-base-url, entitlement-url, timeout, \
             grace-minutes, paywall-on-limit"
        ),
    }

    settings.save_default().await?;
    info!(key, value, "Setting updated");
    println!("Set {key} = {value}");

    Ok(())
}

async fn set_entitled(state: &str) -> Result<()> {
    let app = App::open().await?;

    use toonflow_core::KeyValueStore as _;
    match state {
        "on" | "true" => {
            app.store.set(ENTITLED_KEY, "true").await?;
            println!("Entitled: pro tier active locally");
        }
        "off" | "false" => {
            app.store.remove(ENTITLED_KEY).await?;
            println!("Entitlement cleared: free tier");
        }
        _ => anyhow::bail!("Use 'on' or 'off'"),
    }

    Ok(())
}

async fn reset_usage() -> Result<()> {
    let app = App::open().await?;
    app.ledger.reset().await;
    println!("Usage counter cleared");
    Ok(())
}

async fn reset_config() -> Result<()> {
    let path = default_settings_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
