//! Paywall command - exercise the gate from the command line.

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use clap::{Args, Subcommand};
use serde_json::json;
use tracing::info;

use toonflow_quota::{DismissOutcome, PaywallSession, Screen};

use crate::commands::App;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the paywall command.
#[derive(Args)]
pub struct PaywallArgs {
    #[command(subcommand)]
    pub action: PaywallAction,
}

/// Paywall subcommands.
#[derive(Subcommand)]
pub enum PaywallAction {
    /// Evaluate the gate for a screen.
    Check {
        /// Screen being navigated to (home, gallery, settings, paywall).
        #[arg(long, default_value = "home")]
        screen: Screen,
    },

    /// Dismiss a paywall that has been on screen for a while.
    Dismiss {
        /// How long the paywall has been visible, in seconds.
        #[arg(long, default_value = "0")]
        shown_for: u64,
    },

    /// Show grace-period status.
    Status,

    /// Clear any active grace period and the shown-today marker.
    Reset,
}

/// Runs the paywall command.
pub async fn run(args: &PaywallArgs, cli: &Cli) -> Result<()> {
    let app = App::open().await?;

    match &args.action {
        PaywallAction::Check { screen } => check(&app, *screen, cli).await,
        PaywallAction::Dismiss { shown_for } => dismiss(&app, *shown_for, cli).await,
        PaywallAction::Status => status(&app, cli).await,
        PaywallAction::Reset => reset(&app).await,
    }
}

async fn check(app: &App, screen: Screen, cli: &Cli) -> Result<()> {
    let decision = app.gate.evaluate(screen).await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_decision(&decision));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = match decision {
                toonflow_quota::PaywallDecision::Show { delay, forced } => json!({
                    "show": true,
                    "delayMs": delay.as_millis() as u64,
                    "forced": forced,
                }),
                toonflow_quota::PaywallDecision::Suppressed(reason) => json!({
                    "show": false,
                    "reason": reason.as_str(),
                }),
            };
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(())
}

async fn dismiss(app: &App, shown_for_secs: u64, cli: &Cli) -> Result<()> {
    // Reconstruct a session that appeared `shown_for` seconds ago.
    let shown_at = Utc::now()
        - ChronoDuration::seconds(i64::try_from(shown_for_secs).unwrap_or(i64::MAX));
    let session = PaywallSession::new(shown_at, app.gate.config().close_delay);

    match app.gate.dismiss(&session).await {
        DismissOutcome::GraceStarted { until } => {
            info!(until = %until, "Grace period started");
            if cli.format == OutputFormat::Json {
                let formatter = JsonFormatter::new(cli.pretty);
                println!(
                    "{}",
                    formatter.format(&json!({ "dismissed": true, "graceUntil": until.to_rfc3339() }))?
                );
            } else {
                println!("Dismissed. Paywall suppressed until {until}");
            }
        }
        DismissOutcome::Blocked => {
            if cli.format == OutputFormat::Json {
                let formatter = JsonFormatter::new(cli.pretty);
                println!("{}", formatter.format(&json!({ "dismissed": false }))?);
            } else {
                println!(
                    "Close is not available yet (appears after {}s)",
                    app.gate.config().close_delay.as_secs()
                );
            }
        }
    }

    Ok(())
}

async fn status(app: &App, cli: &Cli) -> Result<()> {
    let grace_active = app.gate.grace_active().await;
    let shown_today = app.gate.shown_today().await;

    match cli.format {
        OutputFormat::Text => {
            println!("Grace active: {grace_active}");
            println!("Shown today:  {shown_today}");
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format(&json!({
                    "graceActive": grace_active,
                    "shownToday": shown_today,
                }))?
            );
        }
    }

    Ok(())
}

async fn reset(app: &App) -> Result<()> {
    app.gate.clear_grace().await;
    app.gate.set_debug_disabled(false).await;
    println!("Paywall state cleared");
    Ok(())
}
