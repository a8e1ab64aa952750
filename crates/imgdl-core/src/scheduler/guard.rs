//! RAII guard that reports a finished fetch to the loop when dropped.

use tokio::sync::mpsc::UnboundedSender;

use crate::catalog::ResourceId;

use super::counters::PassCounters;

/// Decrements in-flight and signals the loop even if the fetch panicked.
pub(super) struct DoneGuard<'a> {
    pub(super) id: ResourceId,
    pub(super) counters: &'a PassCounters,
    pub(super) done: UnboundedSender<ResourceId>,
}

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.counters.finish();
        let _ = self.done.send(self.id);
    }
}
