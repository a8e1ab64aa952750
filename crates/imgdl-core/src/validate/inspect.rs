//! Per-file checks: locate the payload, confirm it, and settle its extension.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};

use crate::storage;
use crate::url_model::{self, PLACEHOLDER_EXT};

use super::ValidationMode;

/// One claimed success to re-check. Paths are relative to the output directory.
#[derive(Debug, Clone)]
pub(super) struct Job {
    pub(super) id: u64,
    pub(super) url: String,
    pub(super) derived: PathBuf,
    pub(super) recorded: PathBuf,
}

#[derive(Debug)]
pub(super) enum Checked {
    Valid {
        relative: PathBuf,
        format: Option<ImageFormat>,
        renamed: bool,
    },
    Invalid {
        relative: PathBuf,
        reason: String,
    },
}

/// Finds the file of `job` under `root`: the recorded path, the derived path,
/// then (for placeholder paths) the derived path under each canonical extension.
pub(super) fn locate(root: &Path, job: &Job) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if !job.recorded.as_os_str().is_empty() {
        candidates.push(job.recorded.clone());
    }
    candidates.push(job.derived.clone());
    if url_model::has_placeholder_ext(&job.derived) {
        candidates.extend(url_model::canonical_exts().map(|ext| job.derived.with_extension(ext)));
    }
    candidates.into_iter().find(|rel| root.join(rel).is_file())
}

/// Reads the header of `path` and reports the detected format.
pub(super) fn detect_format(path: &Path) -> Result<ImageFormat, String> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| format!("open: {}", e))?;
    let format = reader
        .format()
        .ok_or_else(|| "unrecognized image format".to_string())?;
    reader
        .into_dimensions()
        .map_err(|e| format!("decode: {}", e))?;
    Ok(format)
}

/// True when `path`'s extension already names `format`.
fn ext_matches(path: &Path, format: ImageFormat) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(url_model::format_for_ext)
        .map_or(false, |f| f == format)
}

/// Checks one job. Files that fail are left in place; the caller deletes them.
pub(super) fn check(root: &Path, job: &Job, mode: ValidationMode) -> Checked {
    let Some(relative) = locate(root, job) else {
        return Checked::Invalid {
            relative: job.derived.clone(),
            reason: "missing".to_string(),
        };
    };
    let full = root.join(&relative);
    match fs::metadata(&full) {
        Ok(meta) if meta.len() == 0 => {
            return Checked::Invalid {
                relative,
                reason: "empty".to_string(),
            }
        }
        Ok(_) => {}
        Err(e) => {
            return Checked::Invalid {
                relative,
                reason: format!("stat: {}", e),
            }
        }
    }

    let placeholder = url_model::has_placeholder_ext(&relative);
    let format = match mode {
        ValidationMode::Thorough => match detect_format(&full) {
            Ok(f) => Some(f),
            Err(reason) => return Checked::Invalid { relative, reason },
        },
        // Only a placeholder needs a format; a decode failure here is not fatal.
        ValidationMode::Fast if placeholder => match detect_format(&full) {
            Ok(f) => Some(f),
            Err(reason) => {
                tracing::info!(id = job.id, path = %full.display(), "cannot detect format: {}", reason);
                None
            }
        },
        ValidationMode::Fast => None,
    };

    let Some(detected) = format else {
        return Checked::Valid {
            relative,
            format: None,
            renamed: false,
        };
    };
    if !placeholder && ext_matches(&relative, detected) {
        return Checked::Valid {
            relative,
            format: Some(detected),
            renamed: false,
        };
    }

    let ext = url_model::ext_for_format(detected);
    if ext == PLACEHOLDER_EXT {
        return Checked::Valid {
            relative,
            format: Some(detected),
            renamed: false,
        };
    }
    match storage::replace_extension(&full, ext) {
        Ok(_) => {
            let renamed = relative.with_extension(ext);
            tracing::debug!(id = job.id, from = %relative.display(), to = %renamed.display(), "extension corrected");
            Checked::Valid {
                relative: renamed,
                format: Some(detected),
                renamed: true,
            }
        }
        Err(e) => {
            tracing::warn!(id = job.id, path = %full.display(), "rename failed: {}", e);
            Checked::Valid {
                relative,
                format: Some(detected),
                renamed: false,
            }
        }
    }
}
