use std::path::PathBuf;

/// Fatal problems while building the catalog. Duplicates are not errors; they are counted.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot open url list {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read url list at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("url list line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}
