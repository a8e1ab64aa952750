//! Logging init. A download or validation run logs next to its ledger; other
//! commands use the XDG state dir. Falls back to stderr when no file opens.

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,imgdl=debug,imgdl_core=debug";
const LOG_FILE: &str = "imgdl.log";

/// Writer that is either a file or stderr (used when file clone fails).
enum FileOrStderr {
    File(File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct SharedFile(File);

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log files to try, most specific first.
pub fn log_file_candidates(run_log_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = run_log_dir {
        candidates.push(dir.join(LOG_FILE));
    }
    if let Ok(xdg_dirs) = xdg::BaseDirectories::with_prefix("imgdl") {
        candidates.push(xdg_dirs.get_state_home().join(LOG_FILE));
    }
    candidates
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Opens the first candidate that accepts appends.
fn open_first(candidates: &[PathBuf]) -> Result<(PathBuf, File)> {
    let mut last_err = None;
    for path in candidates {
        match open_log_file(path) {
            Ok(file) => return Ok((path.clone(), file)),
            Err(e) => last_err = Some(anyhow!(e).context(format!("open {}", path.display()))),
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("no log location available")))
}

/// Installs the file subscriber. With `run_log_dir` set, logs go to
/// `<run_log_dir>/imgdl.log`, else (or if that fails) to `~/.local/state/imgdl/imgdl.log`.
/// Returns the chosen file; on Err the caller falls back to stderr.
pub fn init_logging(run_log_dir: Option<&Path>) -> Result<PathBuf> {
    let candidates = log_file_candidates(run_log_dir);
    let (path, file) = open_first(&candidates)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(SharedFile(file)))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("install subscriber: {}", e))
        .context("init logging")?;

    if candidates.first() != Some(&path) {
        tracing::warn!("run log directory unavailable, logging to {}", path.display());
    }
    tracing::info!("imgdl logging initialized at {}", path.display());
    Ok(path)
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
