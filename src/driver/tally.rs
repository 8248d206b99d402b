//! Outcome counters

use serde::Serialize;
use std::fmt;

use crate::event::TestStatus;

/// Running counts for a session; changed only by test ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    success: u64,
    fail: u64,
    skipped: u64,
    cancelled: bool,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished test
    pub fn record(&mut self, status: &TestStatus) {
        match status {
            TestStatus::Ok => self.success += 1,
            TestStatus::Skipped { .. } => self.skipped += 1,
            TestStatus::Error { .. } => self.fail += 1,
        }
    }

    /// Note that some node was cancelled
    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn summary(&self) -> Summary {
        Summary {
            success: self.success,
            fail: self.fail,
            skipped: self.skipped,
            cancel: self.cancelled,
        }
    }
}

/// Session summary handed to `terminate`
///
/// Serializes as an ordered map: success, fail, skipped, cancel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub success: u64,
    pub fail: u64,
    pub skipped: u64,
    pub cancel: bool,
}

impl Summary {
    /// Number of tests that reached an end event
    pub fn total(&self) -> u64 {
        self.success + self.fail + self.skipped
    }

    /// No failures and nothing cancelled
    pub fn is_clean(&self) -> bool {
        self.fail == 0 && !self.cancel
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success={} fail={} skipped={} cancel={}",
            self.success, self.fail, self.skipped, self.cancel
        )
    }
}
