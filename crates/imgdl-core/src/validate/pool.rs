//! Runs checks either on a worker pool (thorough) or inline (fast) and
//! settles each result: ledger entry, file deletion, buffered report rows.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use image::ImageFormat;

use crate::ledger::{LedgerEntry, LedgerError, LedgerWriter, OutcomeStatus};
use crate::storage;

use super::inspect::{self, Checked, Job};
use super::ValidationMode;

#[derive(Debug, Clone)]
pub(super) struct Validated {
    pub(super) id: u64,
    pub(super) url: String,
    pub(super) relative: PathBuf,
    pub(super) format: Option<ImageFormat>,
}

#[derive(Debug, Clone)]
pub(super) struct Rejected {
    pub(super) id: u64,
    pub(super) url: String,
    pub(super) relative: PathBuf,
    pub(super) reason: String,
}

#[derive(Debug, Default)]
pub(super) struct Results {
    pub(super) validated: Vec<Validated>,
    pub(super) rejected: Vec<Rejected>,
    pub(super) renamed: usize,
}

pub(super) struct Shared<'a> {
    root: &'a Path,
    mode: ValidationMode,
    ledger: &'a LedgerWriter,
    total: usize,
    checked: AtomicUsize,
    results: Mutex<Results>,
    last_report: Mutex<Instant>,
    progress_interval: Duration,
    stop: AtomicBool,
    fatal: Mutex<Option<LedgerError>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

impl<'a> Shared<'a> {
    pub(super) fn new(
        root: &'a Path,
        mode: ValidationMode,
        ledger: &'a LedgerWriter,
        total: usize,
        progress_interval: Duration,
    ) -> Self {
        Self {
            root,
            mode,
            ledger,
            total,
            checked: AtomicUsize::new(0),
            results: Mutex::new(Results::default()),
            last_report: Mutex::new(Instant::now()),
            progress_interval,
            stop: AtomicBool::new(false),
            fatal: Mutex::new(None),
        }
    }

    fn append(&self, entry: LedgerEntry) {
        if let Err(e) = self.ledger.append(entry) {
            self.stop.store(true, Ordering::Relaxed);
            let mut fatal = lock(&self.fatal);
            if fatal.is_none() {
                *fatal = Some(e);
            }
        }
    }

    fn settle(&self, job: Job, checked: Checked) {
        match checked {
            Checked::Valid {
                relative,
                format,
                renamed,
            } => {
                if renamed {
                    self.append(LedgerEntry::new(
                        job.id,
                        OutcomeStatus::Success,
                        job.url.clone(),
                        relative.clone(),
                    ));
                }
                let mut results = lock(&self.results);
                if renamed {
                    results.renamed += 1;
                }
                results.validated.push(Validated {
                    id: job.id,
                    url: job.url,
                    relative,
                    format,
                });
            }
            Checked::Invalid { relative, reason } => {
                let full = self.root.join(&relative);
                if let Err(e) = storage::remove_file_if_exists(&full) {
                    tracing::warn!(path = %full.display(), "cannot delete invalid file: {}", e);
                }
                tracing::debug!(id = job.id, path = %relative.display(), reason = %reason, "validation failed");
                self.append(LedgerEntry::new(
                    job.id,
                    OutcomeStatus::ValidationFailed,
                    job.url.clone(),
                    relative.clone(),
                ));
                lock(&self.results).rejected.push(Rejected {
                    id: job.id,
                    url: job.url,
                    relative,
                    reason,
                });
            }
        }
        let done = self.checked.fetch_add(1, Ordering::Relaxed) + 1;
        self.maybe_report(done);
    }

    /// Whoever holds the progress lock reports; everyone else moves on.
    fn maybe_report(&self, done: usize) {
        if let Ok(mut last) = self.last_report.try_lock() {
            if last.elapsed() >= self.progress_interval {
                tracing::info!("validation progress {}/{}", done, self.total);
                *last = Instant::now();
            }
        }
    }

    fn run_one(&self, job: Job) {
        let checked = inspect::check(self.root, &job, self.mode);
        self.settle(job, checked);
    }

    pub(super) fn into_results(self) -> Result<Results, LedgerError> {
        if let Some(e) = self.fatal.into_inner().unwrap_or_else(|p| p.into_inner()) {
            return Err(e);
        }
        Ok(self.results.into_inner().unwrap_or_else(|p| p.into_inner()))
    }
}

/// Single-threaded pass.
pub(super) fn run_inline(shared: &Shared<'_>, jobs: Vec<Job>) {
    for job in jobs {
        if shared.stop.load(Ordering::Relaxed) {
            break;
        }
        shared.run_one(job);
    }
}

/// `threads` workers pulling from one shared queue.
pub(super) fn run_pool(shared: &Shared<'_>, jobs: Vec<Job>, threads: usize) {
    let queue = Mutex::new(VecDeque::from(jobs));
    let workers = threads.max(1);
    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                if shared.stop.load(Ordering::Relaxed) {
                    break;
                }
                let Some(job) = lock(&queue).pop_front() else {
                    break;
                };
                shared.run_one(job);
            });
        }
    });
}
