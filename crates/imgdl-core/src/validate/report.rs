//! Validation artifacts and the summary report.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use image::ImageFormat;

use crate::catalog::ResourceId;
use crate::ledger::{LedgerEntry, OutcomeStatus};
use crate::storage::OutputLayout;
use crate::url_model;

use super::error::ValidateError;
use super::pool::Results;

/// Format left out of the second file list.
const EXCLUDED_FORMAT: ImageFormat = ImageFormat::Gif;

/// Totals written to `report.txt`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Distinct resources in the ledger.
    pub total_processed: usize,
    /// Ledger successes before validation.
    pub claimed_success: usize,
    /// Successes that passed validation.
    pub validated_success: usize,
    /// Resources ending in any failure other than a timeout.
    pub general_error: usize,
    pub timeout: usize,
    /// Claimed successes demoted to `ValidationFailed`.
    pub failed: usize,
    /// Files moved to a corrected extension.
    pub renamed: usize,
}

impl ValidationReport {
    /// Folds final statuses: the ledger view with this pass's rejections applied.
    pub(super) fn tally(
        statuses: &BTreeMap<ResourceId, OutcomeStatus>,
        claimed: usize,
        results: &Results,
    ) -> Self {
        let mut report = ValidationReport {
            total_processed: statuses.len(),
            claimed_success: claimed,
            validated_success: results.validated.len(),
            failed: results.rejected.len(),
            renamed: results.renamed,
            ..Default::default()
        };
        for status in statuses.values() {
            match status {
                OutcomeStatus::Success => {}
                OutcomeStatus::TimeOut => report.timeout += 1,
                OutcomeStatus::FileNotExist
                | OutcomeStatus::InvalidUrl
                | OutcomeStatus::GeneralError
                | OutcomeStatus::ValidationFailed => report.general_error += 1,
            }
        }
        report
    }

    pub fn to_text(&self) -> String {
        format!(
            "TotalImageProcessed={}\nClaimedSuccess={}\nValidatedSuccess={}\nGeneralError={}\nTimeout={}\n",
            self.total_processed,
            self.claimed_success,
            self.validated_success,
            self.general_error,
            self.timeout
        )
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ValidateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ValidateError::Artifact {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| ValidateError::Artifact {
        path: path.to_path_buf(),
        source,
    })
}

fn is_excluded(relative: &Path, detected: Option<ImageFormat>) -> bool {
    let format = detected.or_else(|| {
        relative
            .extension()
            .and_then(|e| e.to_str())
            .and_then(url_model::format_for_ext)
    });
    format == Some(EXCLUDED_FORMAT)
}

/// Rewrites every artifact of the validation pass. `results` must be sorted by ID.
pub(super) fn write_artifacts(
    layout: &OutputLayout,
    results: &Results,
    report: &ValidationReport,
) -> Result<(), ValidateError> {
    let mut success = String::new();
    let mut all = String::new();
    let mut without_excluded = String::new();
    for v in &results.validated {
        success.push_str(
            &LedgerEntry::new(v.id, OutcomeStatus::Success, v.url.as_str(), v.relative.clone())
                .to_line(),
        );
        let line = format!("{}\n", layout.image_path(&v.relative).display());
        all.push_str(&line);
        if !is_excluded(&v.relative, v.format) {
            without_excluded.push_str(&line);
        }
    }

    let mut errors = String::new();
    for r in &results.rejected {
        let _ = writeln!(
            errors,
            "{}\t{}\t{}\t{}",
            r.id,
            r.url,
            r.relative.display(),
            r.reason
        );
    }

    write_file(&layout.success_log_path(), &success)?;
    write_file(&layout.file_list_path(), &all)?;
    write_file(&layout.file_list_excluding_path(), &without_excluded)?;
    write_file(&layout.validation_error_path(), &errors)?;
    write_file(&layout.report_path(), &report.to_text())?;
    Ok(())
}
