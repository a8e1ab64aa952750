//! Append-only diagnostic record for runtime failures.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use imgdl_core::storage::OutputLayout;

/// Appends a timestamped record of `err` (message plus full chain) to `path`.
pub fn append_record(path: &Path, err: &anyhow::Error) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "[{}] {}", chrono::Local::now().to_rfc3339(), err)?;
    writeln!(f, "{:?}", err)?;
    writeln!(f)?;
    f.flush()
}

/// Records runtime errors in the run's log directory and hands the error back.
/// Setup errors are returned untouched; they happen before any run state exists.
pub fn recorded(layout: &OutputLayout, err: anyhow::Error) -> anyhow::Error {
    if super::exit::exit_code(&err) == super::exit::EXIT_RUNTIME {
        let path = layout.runtime_log_path();
        match append_record(&path, &err) {
            Ok(()) => tracing::error!(path = %path.display(), "runtime error recorded: {:#}", err),
            Err(e) => tracing::warn!(path = %path.display(), "could not write diagnostic record: {}", e),
        }
    }
    err
}
