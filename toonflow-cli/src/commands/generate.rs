//! Generate command - run a gated image generation.

use anyhow::{Context, Result};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use clap::Args;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use toonflow_quota::GenerateError;

use crate::commands::App;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Source image file.
    #[arg(long, short)]
    pub image: PathBuf,

    /// Style id (see `toonflow styles`).
    #[arg(long, short)]
    pub style: String,

    /// MIME type of the source image. Guessed from the extension when
    /// omitted.
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Write the transformed image here instead of printing.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Runs the generate command.
pub async fn run(args: &GenerateArgs, cli: &Cli) -> Result<()> {
    let app = App::open().await?;
    let orchestrator = app.orchestrator()?;

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("cannot read {}", args.image.display()))?;
    let mime_type = args
        .mime_type
        .clone()
        .unwrap_or_else(|| guess_mime_type(&args.image));

    info!(style = %args.style, bytes = bytes.len(), "Starting generation");

    let result = match orchestrator.generate(&args.style, &bytes, &mime_type).await {
        Ok(result) => result,
        Err(e) => {
            report_gate_error(&e, cli)?;
            let code = match e {
                GenerateError::Failed(_) => ExitCode::GenerationFailed,
                _ => ExitCode::Gated,
            };
            std::process::exit(code as i32);
        }
    };

    // Persist or print the payload.
    if let Some(out) = &args.out {
        if let Some(b64) = &result.image.image {
            let decoded = BASE64_STANDARD
                .decode(b64)
                .context("server returned invalid base64")?;
            tokio::fs::write(out, decoded)
                .await
                .with_context(|| format!("cannot write {}", out.display()))?;
            if !cli.quiet {
                println!("Saved: {}", out.display());
            }
        } else if let Some(url) = &result.image.image_url {
            warn!("Server returned a URL, nothing to save locally");
            println!("{url}");
        }
    } else {
        match cli.format {
            OutputFormat::Text => {
                if let Some(url) = &result.image.image_url {
                    println!("{url}");
                } else if let Some(data_url) = result.image.data_url() {
                    println!("{data_url}");
                }
                if !cli.quiet {
                    let formatter = TextFormatter::new(!cli.no_color);
                    let tier = app.tiers.current_tier().await;
                    println!("{}", formatter.format_usage(tier, &result.usage));
                }
            }
            OutputFormat::Json => {
                let formatter = JsonFormatter::new(cli.pretty);
                let output = json!({
                    "image": result.image,
                    "usage": {
                        "count": result.usage.count,
                        "limit": result.usage.limit,
                        "remaining": result.usage.remaining(),
                    },
                });
                println!("{}", formatter.format(&output)?);
            }
        }
    }

    Ok(())
}

/// Prints a gate refusal in the selected format.
fn report_gate_error(e: &GenerateError, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                let formatter = TextFormatter::new(!cli.no_color);
                eprintln!("{}", formatter.format_error(&e.to_string()));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = json!({
                "error": e.to_string(),
                "retryable": e.is_retryable(),
            });
            println!("{}", formatter.format(&output)?);
        }
    }
    Ok(())
}

/// Maps common image extensions to MIME types.
fn guess_mime_type(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================
