//! Post-pass validation of every claimed success.
//!
//! Thorough mode decodes each image header on a worker pool; fast mode only
//! checks that the file exists and is non-empty, decoding just to resolve
//! placeholder extensions. Fast mode therefore keeps a file whose concrete
//! extension is wrong under that extension.
//!
//! Failures are deleted and appended to the ledger as `ValidationFailed`, so
//! the next download pass re-fetches them.

mod error;
mod inspect;
mod pool;
mod report;

pub use error::ValidateError;
pub use report::ValidationReport;

use std::time::Duration;

use crate::catalog::{Catalog, IdRange};
use crate::ledger::{Ledger, LedgerWriter, OutcomeStatus};
use crate::storage::OutputLayout;
use crate::url_model;

use inspect::Job;
use pool::Shared;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Thorough,
    Fast,
}

impl ValidationMode {
    pub fn from_fast_flag(fast: bool) -> Self {
        if fast {
            ValidationMode::Fast
        } else {
            ValidationMode::Thorough
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub mode: ValidationMode,
    /// Worker threads for thorough mode; fast mode always runs inline.
    pub threads: usize,
    pub bucket_size: u64,
    pub range: IdRange,
    pub progress_interval: Duration,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Thorough,
            threads: 4,
            bucket_size: 1000,
            range: IdRange::All,
            progress_interval: Duration::from_secs(5),
        }
    }
}

/// Validates every in-range `Success` in `ledger` and rewrites all report artifacts.
///
/// `writer` must append to the same ledger `ledger` was read from; it receives
/// `ValidationFailed` rows and re-recorded successes for renamed files.
pub fn run_validation(
    catalog: &Catalog,
    ledger: &Ledger,
    layout: &OutputLayout,
    writer: &LedgerWriter,
    options: &ValidationOptions,
) -> Result<ValidationReport, ValidateError> {
    let jobs: Vec<Job> = ledger
        .entries()
        .filter(|e| e.status == OutcomeStatus::Success && options.range.contains(e.id))
        .map(|e| {
            let url = catalog.url(e.id).unwrap_or(e.url.as_str()).to_string();
            Job {
                id: e.id,
                derived: url_model::derive_path(e.id, &url, options.bucket_size),
                recorded: e.path.clone(),
                url,
            }
        })
        .collect();
    let claimed = jobs.len();
    tracing::info!(claimed, mode = ?options.mode, "validation started");

    let shared = Shared::new(
        layout.output_dir(),
        options.mode,
        writer,
        claimed,
        options.progress_interval,
    );
    match options.mode {
        ValidationMode::Thorough => pool::run_pool(&shared, jobs, options.threads),
        ValidationMode::Fast => pool::run_inline(&shared, jobs),
    }
    let mut results = shared.into_results()?;
    writer.flush()?;
    results.validated.sort_by_key(|v| v.id);
    results.rejected.sort_by_key(|r| r.id);

    let mut statuses = ledger.statuses();
    statuses.retain(|id, _| options.range.contains(*id));
    for r in &results.rejected {
        statuses.insert(r.id, OutcomeStatus::ValidationFailed);
    }
    let report = ValidationReport::tally(&statuses, claimed, &results);
    report::write_artifacts(layout, &results, &report)?;
    tracing::info!(
        validated = report.validated_success,
        failed = report.failed,
        renamed = report.renamed,
        "validation finished"
    );
    Ok(report)
}
