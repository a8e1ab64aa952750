//! Progress snapshots for the CLI.

use std::fmt;

/// Snapshot of one download pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadProgress {
    /// Tasks with a terminal outcome so far.
    pub processed: usize,
    /// Size of the pending set at pass start.
    pub total: usize,
    pub success: usize,
    pub timeout: usize,
    /// `GeneralError` and `FileNotExist`.
    pub error: usize,
    pub invalid: usize,
    pub in_flight: usize,
    pub elapsed_secs: f64,
}

impl DownloadProgress {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.processed as f64 / self.total as f64).min(1.0)
    }

    /// Completions per second (0 if elapsed is 0).
    pub fn rate(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.processed as f64 / self.elapsed_secs
    }

    pub fn is_done(&self) -> bool {
        self.processed >= self.total && self.in_flight == 0
    }
}

impl fmt::Display for DownloadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}:{}:{})",
            self.processed, self.total, self.success, self.timeout, self.error
        )
    }
}
