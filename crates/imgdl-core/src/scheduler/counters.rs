//! Per-pass counters shared between the admission loop and fetch completions.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ledger::OutcomeStatus;

#[derive(Debug, Default)]
pub struct PassCounters {
    processed: AtomicUsize,
    success: AtomicUsize,
    timeout: AtomicUsize,
    error: AtomicUsize,
    invalid: AtomicUsize,
    in_flight: AtomicUsize,
}

impl PassCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one terminal outcome.
    pub fn record(&self, status: OutcomeStatus) {
        let bucket = match status {
            OutcomeStatus::Success => &self.success,
            OutcomeStatus::TimeOut => &self.timeout,
            OutcomeStatus::InvalidUrl => &self.invalid,
            OutcomeStatus::FileNotExist
            | OutcomeStatus::GeneralError
            | OutcomeStatus::ValidationFailed => &self.error,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    /// Saturates at zero.
    pub fn finish(&self) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn success(&self) -> usize {
        self.success.load(Ordering::Relaxed)
    }

    pub fn timeout(&self) -> usize {
        self.timeout.load(Ordering::Relaxed)
    }

    pub fn error(&self) -> usize {
        self.error.load(Ordering::Relaxed)
    }

    pub fn invalid(&self) -> usize {
        self.invalid.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_land_in_their_bucket() {
        let c = PassCounters::new();
        c.record(OutcomeStatus::Success);
        c.record(OutcomeStatus::Success);
        c.record(OutcomeStatus::TimeOut);
        c.record(OutcomeStatus::FileNotExist);
        c.record(OutcomeStatus::GeneralError);
        c.record(OutcomeStatus::InvalidUrl);
        assert_eq!(c.processed(), 6);
        assert_eq!(c.success(), 2);
        assert_eq!(c.timeout(), 1);
        assert_eq!(c.error(), 2);
        assert_eq!(c.invalid(), 1);
    }

    #[test]
    fn in_flight_never_underflows() {
        let c = PassCounters::new();
        c.start();
        c.finish();
        c.finish();
        assert_eq!(c.in_flight(), 0);
    }
}
