//! Terminal slot: the completion-vs-expiry race is settled by one compare-exchange.

use std::sync::atomic::{AtomicU8, Ordering};

const OPEN: u8 = 0;
const COMPLETED: u8 = 1;
const EXPIRED: u8 = 2;

/// Which side resolved a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Completion,
    Expiry,
}

/// Resolved at most once; every later claim fails.
#[derive(Debug, Default)]
pub struct TerminalSlot(AtomicU8);

impl TerminalSlot {
    pub fn new() -> Self {
        Self(AtomicU8::new(OPEN))
    }

    fn claim(&self, to: u8) -> bool {
        self.0
            .compare_exchange(OPEN, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called by the fetch path once the transport returns.
    pub fn claim_completion(&self) -> bool {
        self.claim(COMPLETED)
    }

    /// Called by the timer when the time budget is spent.
    pub fn claim_expiry(&self) -> bool {
        self.claim(EXPIRED)
    }

    pub fn resolved(&self) -> Option<Claim> {
        match self.0.load(Ordering::Acquire) {
            COMPLETED => Some(Claim::Completion),
            EXPIRED => Some(Claim::Expiry),
            _ => None,
        }
    }
}
