//! Thread-safe buffered appender for ledger-shaped logs.
//!
//! Entries queue under one mutex and are written once the queue reaches the
//! flush threshold (1 = write on every append). A failed write leaves the
//! batch queued for the next attempt, so nothing is dropped; a partially
//! written batch may be repeated, which replay tolerates. A queue that grows
//! past `queue_limit` means the sink is stuck and is reported as fatal.
//!
//! Opening for append cuts an unterminated final row (a crash mid-write), so
//! the next row never fuses with it.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::entry::LedgerEntry;
use super::error::LedgerError;

#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    pub flush_threshold: usize,
    pub queue_limit: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            flush_threshold: 1,
            queue_limit: 100_000,
        }
    }
}

struct WriterState {
    queue: VecDeque<LedgerEntry>,
    sink: Box<dyn Write + Send>,
    written: u64,
}

impl WriterState {
    fn flush_queue(&mut self) -> std::io::Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let batch: String = self.queue.iter().map(LedgerEntry::to_line).collect();
        self.sink.write_all(batch.as_bytes())?;
        self.sink.flush()?;
        self.written += self.queue.len() as u64;
        self.queue.clear();
        Ok(())
    }
}

pub struct LedgerWriter {
    path: PathBuf,
    options: WriterOptions,
    state: Mutex<WriterState>,
}

impl LedgerWriter {
    /// Opens `path` for appending, creating it (and its directory) if needed.
    pub fn open_append(path: &Path, options: WriterOptions) -> Result<Self, LedgerError> {
        let mut file = open_file(path, false)?;
        let dropped = trim_torn_tail(&mut file).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if dropped > 0 {
            tracing::warn!(path = %path.display(), bytes = dropped, "cut torn final row");
        }
        Ok(Self::from_writer(path, Box::new(file), options))
    }

    /// Opens `path` truncated; used for logs scoped to a single run.
    pub fn create_truncated(path: &Path, options: WriterOptions) -> Result<Self, LedgerError> {
        let file = open_file(path, true)?;
        Ok(Self::from_writer(path, Box::new(file), options))
    }

    /// Wraps an arbitrary sink; `path` is only used in diagnostics.
    pub fn from_writer(path: &Path, sink: Box<dyn Write + Send>, options: WriterOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            options: WriterOptions {
                flush_threshold: options.flush_threshold.max(1),
                queue_limit: options.queue_limit.max(1),
            },
            state: Mutex::new(WriterState {
                queue: VecDeque::new(),
                sink,
                written: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues `entry`, writing the queue once it reaches the flush threshold.
    /// Only an overflowing queue is an error; write failures are retried later.
    pub fn append(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
        let mut state = self.lock();
        state.queue.push_back(entry);
        if state.queue.len() >= self.options.flush_threshold {
            if let Err(e) = state.flush_queue() {
                tracing::warn!(
                    path = %self.path.display(),
                    pending = state.queue.len(),
                    "ledger write failed, keeping entries queued: {}",
                    e
                );
            }
        }
        let pending = state.queue.len();
        if pending > self.options.queue_limit {
            return Err(LedgerError::BufferOverflow {
                path: self.path.clone(),
                pending,
                limit: self.options.queue_limit,
            });
        }
        Ok(())
    }

    /// Writes everything still queued.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.lock().flush_queue().map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Entries waiting to be written.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Entries written so far.
    pub fn written(&self) -> u64 {
        self.lock().written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerWriter {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = state.flush_queue() {
            tracing::error!(
                path = %self.path.display(),
                lost = state.queue.len(),
                "final ledger flush failed: {}",
                e
            );
        }
    }
}

fn open_file(path: &Path, truncate: bool) -> Result<File, LedgerError> {
    let io_err = |source: io::Error| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.read(true).append(true);
    }
    options.open(path).map_err(io_err)
}

/// Truncates `file` after its last newline. Returns the number of bytes cut.
fn trim_torn_tail(file: &mut File) -> io::Result<u64> {
    let len = file.metadata()?.len();
    let mut end = len;
    let mut buf = [0u8; 4096];
    while end > 0 {
        let start = end.saturating_sub(buf.len() as u64);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(i) = chunk.iter().rposition(|&b| b == b'\n') {
            let keep = start + i as u64 + 1;
            if keep < len {
                file.set_len(keep)?;
            }
            return Ok(len - keep);
        }
        end = start;
    }
    if len > 0 {
        file.set_len(0)?;
    }
    Ok(len)
}
