use crate::ledger::LedgerError;

/// Errors that end a download pass early. Per-resource failures never do.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A ledger or error-log writer overflowed or could not be flushed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
