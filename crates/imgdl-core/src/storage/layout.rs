//! Where a run keeps its images, ledger, and reports.

use std::io;
use std::path::{self, Path, PathBuf};

use crate::config::ImgdlConfig;

const LEDGER_FILE: &str = "download_log.tsv";
const ERROR_LOG_FILE: &str = "download_errors.tsv";
const SUCCESS_LOG_FILE: &str = "success_log.tsv";
const FILE_LIST_FILE: &str = "file_list.txt";
const FILE_LIST_NO_GIF_FILE: &str = "file_list_no_gif.txt";
const VALIDATION_ERROR_FILE: &str = "validation_errors.tsv";
const REPORT_FILE: &str = "report.txt";
const RUNTIME_LOG_FILE: &str = "runtime_error.log";

/// Output tree plus the directory holding the ledger and derived reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_dir: PathBuf,
    log_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(output_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            log_dir: log_dir.into(),
        }
    }

    /// Resolves the configured directories against the working directory, so
    /// file lists and reports carry absolute paths.
    pub fn from_config(cfg: &ImgdlConfig) -> io::Result<Self> {
        Ok(Self::new(
            path::absolute(&cfg.output_dir)?,
            path::absolute(cfg.log_dir())?,
        ))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Absolute (or output-relative) location of an image given its derived relative path.
    pub fn image_path(&self, relative: &Path) -> PathBuf {
        self.output_dir.join(relative)
    }

    /// Append-only status ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.log_dir.join(LEDGER_FILE)
    }

    /// Non-success attempts of the current download run (truncated each run).
    pub fn error_log_path(&self) -> PathBuf {
        self.log_dir.join(ERROR_LOG_FILE)
    }

    pub fn success_log_path(&self) -> PathBuf {
        self.log_dir.join(SUCCESS_LOG_FILE)
    }

    pub fn file_list_path(&self) -> PathBuf {
        self.log_dir.join(FILE_LIST_FILE)
    }

    /// File list without the excluded (animated) format.
    pub fn file_list_excluding_path(&self) -> PathBuf {
        self.log_dir.join(FILE_LIST_NO_GIF_FILE)
    }

    pub fn validation_error_path(&self) -> PathBuf {
        self.log_dir.join(VALIDATION_ERROR_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.log_dir.join(REPORT_FILE)
    }

    /// Diagnostic record for unrecoverable runtime errors.
    pub fn runtime_log_path(&self) -> PathBuf {
        self.log_dir.join(RUNTIME_LOG_FILE)
    }

    /// Every file derived from the ledger; removed together with it on a fresh start.
    pub fn derived_paths(&self) -> Vec<PathBuf> {
        vec![
            self.error_log_path(),
            self.success_log_path(),
            self.file_list_path(),
            self.file_list_excluding_path(),
            self.validation_error_path(),
            self.report_path(),
        ]
    }
}
