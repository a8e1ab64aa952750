use std::io;

/// Why a single fetch produced no usable payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The cancel flag was raised (per-fetch time budget spent).
    #[error("cancelled")]
    Cancelled,
    /// curl reported an error (connect, resolve, timeout, ...).
    #[error("curl: {0}")]
    Curl(#[from] ::curl::Error),
    /// Final response was not 2xx; the body was discarded.
    #[error("HTTP {0}")]
    Http(u32),
    /// Writing the destination file failed.
    #[error("storage: {0}")]
    Storage(#[from] io::Error),
}
