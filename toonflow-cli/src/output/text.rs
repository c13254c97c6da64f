//! Text output formatting with progress bars and colors.

use toonflow_core::{StyleEntry, SubscriptionTier, UsageReport};
use toonflow_quota::{PaywallDecision, SuppressReason};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats the daily usage report.
    pub fn format_usage(&self, tier: SubscriptionTier, report: &UsageReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} ({})",
            self.bold("Today's generations"),
            self.cyan(tier.as_str())
        ));

        let remaining_fraction = if report.limit == 0 {
            0.0
        } else {
            f64::from(report.remaining()) / f64::from(report.limit) * 100.0
        };
        let bar = self.progress_bar(remaining_fraction);
        let counts = format!("{}/{} used", report.count, report.limit);
        lines.push(format!("{:<8} {} {}", "Quota:", bar, counts));

        if report.limit_reached {
            lines.push(self.red("Daily limit reached - upgrade or come back tomorrow"));
        } else {
            lines.push(format!("{} remaining today", report.remaining()));
        }

        lines.join("\n")
    }

    /// Formats the style catalog.
    pub fn format_styles(&self, styles: &[StyleEntry]) -> String {
        let mut lines = vec![self.bold("Available styles")];
        for style in styles {
            let marker = if style.requires_pro {
                self.yellow("PRO")
            } else {
                self.green("free")
            };
            lines.push(format!(
                "{:<16} {:<6} {}",
                style.id,
                marker,
                self.dim(&style.description)
            ));
        }
        lines.join("\n")
    }

    /// Formats a gate decision.
    pub fn format_decision(&self, decision: &PaywallDecision) -> String {
        match decision {
            PaywallDecision::Show { delay, forced } => {
                let kind = if *forced {
                    self.red("hard paywall")
                } else {
                    self.yellow("paywall")
                };
                format!("Show {kind} after {}ms", delay.as_millis())
            }
            PaywallDecision::Suppressed(reason) => {
                let why = match reason {
                    SuppressReason::Entitled => "active subscription",
                    SuppressReason::GraceActive => "dismissal grace period",
                    SuppressReason::AlreadyOnPaywall => "already on paywall",
                    SuppressReason::DebugDisabled => "debug kill switch",
                };
                format!("Suppressed ({})", self.green(why))
            }
        }
    }

    /// Formats an error line.
    pub fn format_error(&self, message: &str) -> String {
        self.red(message)
    }

    /// Renders a progress bar for a remaining percentage.
    pub fn progress_bar(&self, remaining_percent: f64) -> String {
        let filled = ((remaining_percent / 100.0) * self.bar_width as f64).round() as usize;
        let filled = filled.min(self.bar_width);

        let bar: String = std::iter::repeat(BAR_FULL)
            .take(filled)
            .chain(std::iter::repeat(BAR_EMPTY).take(self.bar_width - filled))
            .collect();

        if !self.use_colors {
            return bar;
        }

        let color = if remaining_percent < 20.0 {
            RED
        } else if remaining_percent < 50.0 {
            YELLOW
        } else {
            GREEN
        };
        format!("{color}{bar}{RESET}")
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_colors {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }

    fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    fn cyan(&self, s: &str) -> String {
        self.paint(CYAN, s)
    }
}
