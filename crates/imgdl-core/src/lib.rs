pub mod catalog;
pub mod config;
pub mod logging;

// Download orchestration
pub mod fetch;
pub mod ledger;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod url_model;
pub mod validate;

pub use session::{RunSummary, Session, StatusSummary};
