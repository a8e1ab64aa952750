//! Per-task timers owned by the admission loop.
//!
//! `arm` starts a timer that waits for the fetch to leave the blocking-pool
//! queue, then runs down the budget and, on expiry, claims the task's slot and
//! raises its cancel flag. It never touches the ledger. `retire` is called by the loop
//! after the fetch reports back and aborts the timer if it is still pending.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::catalog::ResourceId;

use super::slot::TerminalSlot;

struct ArmedTask {
    cancel: Arc<AtomicBool>,
    timer: JoinHandle<()>,
}

#[derive(Default)]
pub(super) struct TaskRegistry {
    tasks: HashMap<ResourceId, ArmedTask>,
}

impl TaskRegistry {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn arm(
        &mut self,
        id: ResourceId,
        slot: Arc<TerminalSlot>,
        cancel: Arc<AtomicBool>,
        budget: Duration,
        started: oneshot::Receiver<()>,
    ) {
        let flag = Arc::clone(&cancel);
        let timer = tokio::spawn(async move {
            // Sender dropped unsent: the fetch never ran.
            if started.await.is_err() {
                return;
            }
            tokio::time::sleep(budget).await;
            if slot.claim_expiry() {
                flag.store(true, Ordering::Relaxed);
                tracing::debug!(id, "fetch time budget spent, cancelling");
            }
        });
        if let Some(stale) = self.tasks.insert(id, ArmedTask { cancel, timer }) {
            stale.timer.abort();
        }
    }

    /// Tears down the timer of a finished task. Returns false for unknown IDs.
    pub(super) fn retire(&mut self, id: ResourceId) -> bool {
        match self.tasks.remove(&id) {
            Some(task) => {
                task.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Raises every cancel flag; used when the pass must stop early.
    pub(super) fn cancel_all(&self) {
        for task in self.tasks.values() {
            task.cancel.store(true, Ordering::Relaxed);
        }
    }

    pub(super) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.timer.abort();
        }
    }
}
