//! Usage-record and usage-report types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Usage Record
// ============================================================================

/// The persisted per-day generation counter.
///
/// At most one record is live at a time. Reading on a new calendar day
/// implicitly resets the count to zero for that day; the reset is observed
/// on read and only persisted by the next increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Generations consumed on `date`.
    pub count: u32,
    /// The device-local calendar day the count applies to.
    pub date: NaiveDate,
}

impl UsageRecord {
    /// Creates an empty record for the given day.
    pub fn empty(date: NaiveDate) -> Self {
        Self { count: 0, date }
    }

    /// Returns this record rolled over to `today`.
    ///
    /// A record from a previous day is observed as zero; a same-day record
    /// is returned unchanged.
    pub fn observed_on(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::empty(today)
        }
    }
}

// ============================================================================
// Usage Report
// ============================================================================

/// Count/limit view returned by ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    /// Generations consumed today.
    pub count: u32,
    /// The tier-dependent daily limit in effect.
    pub limit: u32,
    /// True once `count >= limit`.
    pub limit_reached: bool,
}

impl UsageReport {
    /// Builds a report from a count and limit.
    pub fn new(count: u32, limit: u32) -> Self {
        Self {
            count,
            limit,
            limit_reached: count >= limit,
        }
    }

    /// Generations left today. Never negative, even when the count has
    /// overshot the limit.
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

// ============================================================================
// Tests
// ============================================================================
