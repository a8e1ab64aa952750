//! Everything a fetch task needs, shared between the loop and blocking workers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::fetch::Transport;
use crate::ledger::{LedgerEntry, LedgerError, LedgerWriter, OutcomeStatus};
use crate::storage::OutputLayout;

use super::counters::PassCounters;

#[derive(Debug, Clone)]
pub struct PassOptions {
    /// Maximum fetches in flight.
    pub concurrency: usize,
    /// Per-fetch time budget.
    pub surviving_time: Duration,
    /// Images per bucket directory.
    pub bucket_size: u64,
    /// Upper bound on one idle wait of the admission loop.
    pub idle_interval: Duration,
    /// How often a progress snapshot is emitted.
    pub progress_interval: Duration,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            concurrency: 64,
            surviving_time: Duration::from_secs(60),
            bucket_size: 1000,
            idle_interval: Duration::from_millis(50),
            progress_interval: Duration::from_secs(5),
        }
    }
}

/// Owns the writers and counters of one download pass.
pub struct FetchContext {
    pub(super) catalog: Arc<Catalog>,
    pub(super) layout: OutputLayout,
    pub(super) ledger: Arc<LedgerWriter>,
    pub(super) errors: Arc<LedgerWriter>,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) counters: PassCounters,
    pub(super) options: PassOptions,
    fatal: Mutex<Option<LedgerError>>,
}

impl FetchContext {
    pub fn new(
        catalog: Arc<Catalog>,
        layout: OutputLayout,
        ledger: Arc<LedgerWriter>,
        errors: Arc<LedgerWriter>,
        transport: Arc<dyn Transport>,
        options: PassOptions,
    ) -> Self {
        Self {
            catalog,
            layout,
            ledger,
            errors,
            transport,
            counters: PassCounters::new(),
            options,
            fatal: Mutex::new(None),
        }
    }

    pub fn counters(&self) -> &PassCounters {
        &self.counters
    }

    pub fn options(&self) -> &PassOptions {
        &self.options
    }

    /// Writes the single terminal entry of a task: ledger always, error log
    /// for anything but success. Writer overflow is parked as the pass's fatal error.
    pub(super) fn record(&self, entry: LedgerEntry) {
        self.counters.record(entry.status);
        if entry.status != OutcomeStatus::Success {
            tracing::debug!(id = entry.id, url = %entry.url, status = %entry.status, "fetch failed");
            if let Err(e) = self.errors.append(entry.clone()) {
                self.set_fatal(e);
            }
        }
        if let Err(e) = self.ledger.append(entry) {
            self.set_fatal(e);
        }
    }

    /// Keeps the first fatal error.
    fn set_fatal(&self, err: LedgerError) {
        let mut slot = self.fatal.lock().unwrap_or_else(|p| p.into_inner());
        if slot.is_none() {
            tracing::error!("download pass aborting: {}", err);
            *slot = Some(err);
        }
    }

    pub(super) fn take_fatal(&self) -> Option<LedgerError> {
        self.fatal.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}
