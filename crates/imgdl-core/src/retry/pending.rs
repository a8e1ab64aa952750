//! Pending set: catalog × ledger under the retry policy, restricted to the ID range.

use crate::catalog::{Catalog, IdRange, ResourceId};
use crate::ledger::Ledger;

use super::policy::{PassDecision, RetryPolicy};

/// Why IDs were left out of a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSummary {
    pub in_range: usize,
    pub enqueued: usize,
    pub skipped: usize,
    pub out_of_range: usize,
}

/// IDs to fetch this pass, ascending.
pub fn pending(
    catalog: &Catalog,
    ledger: Option<&Ledger>,
    range: IdRange,
    policy: RetryPolicy,
) -> (Vec<ResourceId>, PendingSummary) {
    let mut summary = PendingSummary::default();
    let mut ids = Vec::new();
    for id in catalog.ids() {
        if !range.contains(id) {
            summary.out_of_range += 1;
            continue;
        }
        summary.in_range += 1;
        let prior = ledger.and_then(|l| l.status(id));
        match policy.decide(prior) {
            PassDecision::Enqueue => ids.push(id),
            PassDecision::Skip => summary.skipped += 1,
        }
    }
    summary.enqueued = ids.len();
    tracing::debug!(
        in_range = summary.in_range,
        enqueued = summary.enqueued,
        skipped = summary.skipped,
        out_of_range = summary.out_of_range,
        "pending set computed"
    );
    (ids, summary)
}
