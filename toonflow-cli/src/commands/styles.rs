//! Styles command - list the style catalog.

use anyhow::Result;
use toonflow_quota::StyleCatalog;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the styles command.
pub async fn run(cli: &Cli) -> Result<()> {
    let styles = StyleCatalog::all();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_styles(styles));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&styles)?);
        }
    }

    Ok(())
}
