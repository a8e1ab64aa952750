//! Disk-side file lifecycle for fetched images.
//!
//! Destination directories, partial-file cleanup after failed fetches,
//! extension rewrites after validation, and the guard that keeps two runs
//! from sharing one output tree.

mod layout;

pub use layout::OutputLayout;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Refusal to reuse an output directory that holds data but no ledger.
#[derive(Debug, thiserror::Error)]
#[error("output directory {} is not empty and has no ledger; use --force-new to start over", .0.display())]
pub struct OutputDirInUse(pub PathBuf);

/// Creates the bucket directory for `dest`.
pub fn prepare_destination(dest: &Path) -> io::Result<()> {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Deletes `path`, treating an already-missing file as success.
pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Moves `path` to the same name with extension `ext`, leaving the data unchanged.
/// Falls back to copy + remove when a rename is refused.
pub fn replace_extension(path: &Path, ext: &str) -> io::Result<PathBuf> {
    let target = path.with_extension(ext);
    if target == path {
        return Ok(target);
    }
    if fs::rename(path, &target).is_err() {
        fs::copy(path, &target)?;
        fs::remove_file(path)?;
    }
    Ok(target)
}

/// Refuses a non-empty output directory unless a ledger proves it belongs to
/// this catalog or a fresh start was requested. The log directory is ignored.
pub fn ensure_output_dir_available(
    layout: &OutputLayout,
    ledger_present: bool,
    force_new: bool,
) -> Result<(), OutputDirInUse> {
    if ledger_present || force_new {
        return Ok(());
    }
    let entries = match fs::read_dir(layout.output_dir()) {
        Ok(entries) => entries,
        Err(_) => return Ok(()),
    };
    let occupied = entries
        .flatten()
        .any(|entry| entry.path() != layout.log_dir());
    if occupied {
        return Err(OutputDirInUse(layout.output_dir().to_path_buf()));
    }
    Ok(())
}

/// Removes the ledger and every derived report. Returns how many files were deleted.
pub fn clear_run_files(layout: &OutputLayout) -> io::Result<usize> {
    let mut removed = 0;
    for path in std::iter::once(layout.ledger_path()).chain(layout.derived_paths()) {
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!(path = %path.display(), "removed for fresh start");
            removed += 1;
        }
    }
    Ok(removed)
}
