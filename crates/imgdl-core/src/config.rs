use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{IdRange, InvalidRange};

/// Smallest accepted per-fetch time budget.
pub const MIN_SURVIVING_TIME_SECS: u64 = 5;
/// Smallest accepted bucket size (images per output sub-folder).
pub const MIN_IMAGES_IN_ONE_FOLDER: u64 = 100;

/// Configuration problems; always reported before any I/O on the output tree starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot locate config directory: {0}")]
    Locate(String),
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot write default config {path}: {reason}")]
    Write { path: PathBuf, reason: String },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    Range(#[from] InvalidRange),
}

/// Run configuration loaded from `~/.config/imgdl/config.toml` or an explicit path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImgdlConfig {
    /// Catalog file: one `URL` or `URL<TAB>ID` per line.
    pub url_list: PathBuf,
    /// Root of the bucketed image tree.
    pub output_dir: PathBuf,
    /// Where the ledger and reports live. Defaults to `<output_dir>/logs`.
    pub log_dir: Option<PathBuf>,
    /// Maximum fetches in flight at once.
    pub concurrent_threads: usize,
    /// Worker threads for thorough validation.
    pub validation_threads: usize,
    /// Per-fetch time budget in seconds before the transfer is cancelled.
    pub thread_surviving_time_secs: u64,
    /// Bucket size: images per numbered sub-folder.
    pub images_in_one_folder: u64,
    /// Discard the ledger and all reports, then start over.
    pub force_new_download: bool,
    /// Catalog lines carry an explicit ID in the second column.
    pub use_image_id_in_url_list: bool,
    /// Re-attempt `FileNotExist` and `GeneralError` entries.
    pub try_failed_download: bool,
    /// Validate by size only (decode only to resolve unknown extensions).
    pub fast_validation: bool,
    /// Skip the download pass and only validate.
    pub validation_only: bool,
    /// `"all"` or an inclusive `lo-hi` ID range.
    pub image_record_range: String,
    /// Ledger entries buffered before a write (1 = write on every completion).
    pub log_flush_threshold: usize,
    /// Safety bound on buffered ledger entries; exceeding it aborts the run.
    pub log_queue_limit: usize,
    /// TCP connect timeout for each fetch.
    pub connect_timeout_secs: u64,
    /// Optional User-Agent header.
    pub user_agent: Option<String>,
}

impl Default for ImgdlConfig {
    fn default() -> Self {
        Self {
            url_list: PathBuf::from("urls.txt"),
            output_dir: PathBuf::from("images"),
            log_dir: None,
            concurrent_threads: 64,
            validation_threads: 4,
            thread_surviving_time_secs: 60,
            images_in_one_folder: 1000,
            force_new_download: false,
            use_image_id_in_url_list: false,
            try_failed_download: false,
            fast_validation: false,
            validation_only: false,
            image_record_range: "all".to_string(),
            log_flush_threshold: 1,
            log_queue_limit: 100_000,
            connect_timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl ImgdlConfig {
    /// Checks every setting against its floor. Call before any work begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrent_threads < 1 {
            return Err(invalid("concurrent_threads", "must be at least 1"));
        }
        if self.validation_threads < 1 {
            return Err(invalid("validation_threads", "must be at least 1"));
        }
        if self.thread_surviving_time_secs < MIN_SURVIVING_TIME_SECS {
            return Err(invalid(
                "thread_surviving_time_secs",
                format!("must be at least {MIN_SURVIVING_TIME_SECS}"),
            ));
        }
        if self.images_in_one_folder < MIN_IMAGES_IN_ONE_FOLDER {
            return Err(invalid(
                "images_in_one_folder",
                format!("must be at least {MIN_IMAGES_IN_ONE_FOLDER}"),
            ));
        }
        if self.log_flush_threshold < 1 {
            return Err(invalid("log_flush_threshold", "must be at least 1"));
        }
        if self.log_queue_limit < self.log_flush_threshold {
            return Err(invalid(
                "log_queue_limit",
                "must not be smaller than log_flush_threshold",
            ));
        }
        if self.force_new_download && self.validation_only {
            return Err(invalid(
                "validation_only",
                "cannot be combined with force_new_download (nothing would be left to validate)",
            ));
        }
        self.id_range()?;
        Ok(())
    }

    pub fn id_range(&self) -> Result<IdRange, ConfigError> {
        Ok(self.image_record_range.parse::<IdRange>()?)
    }

    pub fn surviving_time(&self) -> Duration {
        Duration::from_secs(self.thread_surviving_time_secs)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("logs"))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("imgdl")
        .map_err(|e| ConfigError::Locate(e.to_string()))?;
    xdg_dirs
        .place_config_file("config.toml")
        .map_err(|e| ConfigError::Locate(e.to_string()))
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<ImgdlConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration from the XDG config dir, creating a default file if none exists.
pub fn load_or_init() -> Result<ImgdlConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ImgdlConfig::default();
        let write_err = |reason: String| ConfigError::Write {
            path: path.clone(),
            reason,
        };
        let toml = toml::to_string_pretty(&default_cfg).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        fs::write(&path, toml).map_err(|e| write_err(e.to_string()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}
