use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A complete row that cannot be parsed. Resuming from it could silently lose outcomes.
    #[error("corrupt ledger {}: malformed row at line {line}: {content:?}", .path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        content: String,
    },
    /// Buffered entries passed the safety bound; the writer is stuck.
    #[error("ledger write queue overflow for {}: {pending} entries pending (limit {limit})", .path.display())]
    BufferOverflow {
        path: PathBuf,
        pending: usize,
        limit: usize,
    },
    #[error("ledger I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
