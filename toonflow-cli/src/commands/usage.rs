//! Usage command - show today's quota state.

use anyhow::Result;
use tracing::info;

use crate::commands::App;
use crate::output::{JsonFormatter, TextFormatter, UsageOutput};
use crate::{Cli, OutputFormat};

/// Runs the usage command.
pub async fn run(cli: &Cli) -> Result<()> {
    let app = App::open().await?;

    let tier = app.tiers.current_tier().await;
    let report = app.ledger.current_usage().await;
    info!(tier = tier.as_str(), count = report.count, "Usage loaded");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_usage(tier, &report));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&UsageOutput::new(tier, &report))?);
        }
    }

    Ok(())
}
