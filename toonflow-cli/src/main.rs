// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! ToonFlow CLI - usage quota and paywall gating from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Show today's usage for the current tier
//! toonflow
//!
//! # List the style catalog
//! toonflow styles
//!
//! # Run a gated generation
//! toonflow generate --image photo.jpg --style ghibli --out toon.png
//!
//! # Ask the gate whether the paywall would show on the home screen
//! toonflow paywall check --screen home
//!
//! # Dismiss a paywall that has been up for 10 seconds
//! toonflow paywall dismiss --shown-for 10
//!
//! # JSON output
//! toonflow usage --format json --pretty
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{config, generate, paywall, styles, usage};

// ============================================================================
// CLI Definition
// ============================================================================

/// ToonFlow CLI - usage quota and paywall gating.
#[derive(Parser)]
#[command(name = "toonflow")]
#[command(about = "Usage quota and paywall gating CLI")]
#[command(long_about = r#"
ToonFlow gates photo stylization behind a per-day quota and a paywall.

Free tier:  2 generations per day, one free style
Pro tier:   100 generations per day, every style

Examples:
  toonflow                                   # Today's usage
  toonflow styles                            # Style catalog
  toonflow generate -i photo.jpg -s ghibli   # Gated generation
  toonflow paywall check --screen home       # Gate decision
  toonflow config show                       # Current settings
"#)]
#[command(version)]
#[command(author = "ToonFlow Contributors")]
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

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show today's usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage,

    /// List the style catalog.
    #[command(visible_alias = "s")]
    Styles,

    /// Run a gated image generation.
    #[command(visible_alias = "g")]
    Generate(generate::GenerateArgs),

    /// Exercise the paywall gate.
    #[command(visible_alias = "p")]
    Paywall(paywall::PaywallArgs),

    /// Manage configuration and local state.
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

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Blocked by a gate (quota exhausted or pro-only style).
    Gated = 2,
    /// The remote generation call failed.
    GenerationFailed = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("toonflow=debug,info")
    } else {
        EnvFilter::new("toonflow=warn")
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
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Usage) | None => usage::run(&cli).await,
        Some(Commands::Styles) => styles::run(&cli).await,
        Some(Commands::Generate(args)) => generate::run(args, &cli).await,
        Some(Commands::Paywall(args)) => paywall::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
