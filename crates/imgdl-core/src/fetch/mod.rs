//! Transport seam for single-resource fetches.
//!
//! The scheduler only needs "write the body of `url` to `dest`, give up when
//! `cancel` is raised". [`CurlTransport`] is the production implementation;
//! tests substitute scripted transports.

mod classify;
mod curl_transport;
mod error;
mod handler;

pub use curl_transport::{CurlTransport, TransportOptions};
pub use classify::{classify, classify_http_status};
pub use error::FetchError;

use std::path::Path;
use std::sync::atomic::AtomicBool;

/// Fetches one URL into one file. Called from blocking worker threads.
pub trait Transport: Send + Sync {
    /// Writes the response body to `dest` (created or truncated) and returns
    /// the byte count. Must return promptly with [`FetchError::Cancelled`]
    /// once `cancel` is set.
    fn fetch(&self, url: &str, dest: &Path, cancel: &AtomicBool) -> Result<u64, FetchError>;
}
