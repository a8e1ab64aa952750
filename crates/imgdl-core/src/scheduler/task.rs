//! One fetch on the blocking pool, from transport call to ledger entry.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use crate::catalog::ResourceId;
use crate::fetch;
use crate::ledger::{LedgerEntry, OutcomeStatus};
use crate::storage;

use super::context::FetchContext;
use super::slot::TerminalSlot;

pub(super) struct FetchTask {
    pub(super) id: ResourceId,
    pub(super) url: String,
    /// Path relative to the output directory, as written to the ledger.
    pub(super) relative: PathBuf,
    pub(super) dest: PathBuf,
}

/// Runs the transport, settles the slot, and records exactly one outcome.
pub(super) fn run_fetch(ctx: &FetchContext, task: FetchTask, slot: &TerminalSlot, cancel: &AtomicBool) {
    let result = ctx.transport.fetch(&task.url, &task.dest, cancel);
    let status = if slot.claim_completion() {
        match &result {
            Ok(bytes) => {
                tracing::trace!(id = task.id, bytes, "fetched");
                OutcomeStatus::Success
            }
            Err(e) => {
                tracing::debug!(id = task.id, url = %task.url, "fetch error: {}", e);
                fetch::classify(e)
            }
        }
    } else {
        OutcomeStatus::TimeOut
    };
    if status != OutcomeStatus::Success {
        discard_partial(&task.dest);
    }
    ctx.record(LedgerEntry::new(task.id, status, task.url, task.relative));
}

fn discard_partial(dest: &Path) {
    if let Err(e) = storage::remove_file_if_exists(dest) {
        tracing::warn!(path = %dest.display(), "could not remove partial file: {}", e);
    }
}
