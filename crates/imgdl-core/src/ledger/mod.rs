//! Crash-recoverable status ledger.
//!
//! The ledger is an append-only TSV log of terminal outcomes. Loading it
//! replays every row and keeps the latest status per resource, so duplicates
//! are harmless and a torn final row only loses outcomes still in flight.

mod entry;
mod error;
mod load;
mod status;
mod writer;

pub use entry::LedgerEntry;
pub use error::LedgerError;
pub use load::{load, Ledger};
pub use status::OutcomeStatus;
pub use writer::{LedgerWriter, WriterOptions};

#[cfg(test)]
mod tests;
