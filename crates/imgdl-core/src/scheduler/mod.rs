//! Bounded-concurrency fetch scheduler.
//!
//! One async admission loop walks the pending queue, starts each fetch on the
//! blocking pool, and arms a timer per fetch. A fetch and its timer race for the
//! task's [`TerminalSlot`]; whichever claims it first decides the outcome, and
//! the completion path writes the single ledger entry for the task. Timers are
//! torn down by the loop once the task reports back.

mod context;
mod counters;
mod error;
mod guard;
mod progress;
mod registry;
mod run;
mod slot;
mod task;

pub use context::{FetchContext, PassOptions};
pub use counters::PassCounters;
pub use error::SchedulerError;
pub use progress::DownloadProgress;
pub use run::run_download_pass;
pub use slot::{Claim, TerminalSlot};
