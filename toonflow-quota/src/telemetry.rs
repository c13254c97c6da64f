//! Telemetry sinks backed by `tracing`.
//!
//! The default sinks route analytics events and error reports into the
//! process log. Hosts with a real analytics or crash-reporting backend
//! supply their own [`AnalyticsSink`] / [`ErrorSink`] implementations
//! instead.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use toonflow_core::{AnalyticsSink, ErrorSink, LogLevel};

/// Analytics sink that logs events at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track(&self, event: &str, properties: Value) {
        info!(target: "toonflow::analytics", event, %properties, "Event tracked");
    }
}

/// Error sink that logs reports at the matching tracing level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn capture_exception(&self, message: &str, context: Value) {
        error!(target: "toonflow::errors", %context, "{message}");
    }

    fn log_message(&self, message: &str, level: LogLevel, context: Value) {
        match level {
            LogLevel::Debug => debug!(target: "toonflow::errors", %context, "{message}"),
            LogLevel::Info => info!(target: "toonflow::errors", %context, "{message}"),
            LogLevel::Warning => warn!(target: "toonflow::errors", %context, "{message}"),
            LogLevel::Error => error!(target: "toonflow::errors", %context, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sinks_never_panic() {
        let analytics = TracingAnalytics;
        analytics.track("generation_completed", json!({ "style": "anime" }));

        let errors = TracingErrorSink;
        errors.capture_exception("boom", json!({}));
        errors.log_message("note", LogLevel::Warning, json!({ "key": "value" }));
    }
}
