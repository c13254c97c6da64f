//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use toonflow_core::{SubscriptionTier, UsageReport};

/// JSON output for the usage command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub tier: String,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub limit_reached: bool,
}

impl UsageOutput {
    /// Builds the output from a report.
    pub fn new(tier: SubscriptionTier, report: &UsageReport) -> Self {
        Self {
            tier: tier.as_str().to_string(),
            count: report.count,
            limit: report.limit,
            remaining: report.remaining(),
            limit_reached: report.limit_reached,
        }
    }
}

/// JSON formatter with optional pretty printing.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Serializes any value.
    pub fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        let out = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(out)
    }
}
