//! Retry eligibility between passes.
//!
//! A pass enqueues every in-range catalog ID whose latest ledger status the
//! policy accepts. Eligibility depends only on that status, never on how many
//! passes have run before.

mod pending;
mod policy;

pub use pending::{pending, PendingSummary};
pub use policy::{PassDecision, RetryPolicy};
