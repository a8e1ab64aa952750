use std::path::PathBuf;

use crate::ledger::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("cannot write {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
