//! One run over one output tree: catalog, ledger, download pass, validation.
//!
//! The session owns the per-run state (layout, catalog, writers, counters);
//! nothing here is global, so tests can run several sessions side by side.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::catalog::{Catalog, IdRange};
use crate::config::ImgdlConfig;
use crate::fetch::{CurlTransport, Transport, TransportOptions};
use crate::ledger::{self, Ledger, LedgerWriter, OutcomeStatus, WriterOptions};
use crate::retry::{self, PendingSummary, RetryPolicy};
use crate::scheduler::{self, DownloadProgress, FetchContext, PassOptions};
use crate::storage::{self, OutputLayout};
use crate::validate::{self, ValidationMode, ValidationOptions, ValidationReport};

/// What a full run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// `None` when the run only validated.
    pub download: Option<DownloadProgress>,
    pub pending: PendingSummary,
    pub report: ValidationReport,
}

/// Ledger state measured against the catalog.
#[derive(Debug, Clone, Default)]
pub struct StatusSummary {
    pub catalog_size: usize,
    pub in_range: usize,
    pub never_attempted: usize,
    pub by_status: BTreeMap<OutcomeStatus, usize>,
    pub pending: usize,
}

pub struct Session {
    config: ImgdlConfig,
    layout: OutputLayout,
    catalog: Arc<Catalog>,
    range: IdRange,
}

impl Session {
    /// Validates `config` and builds the catalog. Touches nothing on disk.
    pub fn open(config: ImgdlConfig) -> Result<Self> {
        config.validate()?;
        let range = config.id_range()?;
        let catalog = Catalog::load(&config.url_list, config.use_image_id_in_url_list)?;
        let layout = OutputLayout::from_config(&config).context("resolve output directory")?;
        Ok(Self {
            config,
            layout,
            catalog: Arc::new(catalog),
            range,
        })
    }

    pub fn config(&self) -> &ImgdlConfig {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.try_failed_download)
    }

    fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            flush_threshold: self.config.log_flush_threshold,
            queue_limit: self.config.log_queue_limit,
        }
    }

    pub fn pass_options(&self) -> PassOptions {
        PassOptions {
            concurrency: self.config.concurrent_threads,
            surviving_time: self.config.surviving_time(),
            bucket_size: self.config.images_in_one_folder,
            ..PassOptions::default()
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            mode: ValidationMode::from_fast_flag(self.config.fast_validation),
            threads: self.config.validation_threads,
            bucket_size: self.config.images_in_one_folder,
            range: self.range,
            progress_interval: Duration::from_secs(5),
        }
    }

    pub fn curl_transport(&self) -> CurlTransport {
        CurlTransport::new(TransportOptions {
            connect_timeout: Duration::from_secs(self.config.connect_timeout_secs),
            user_agent: self.config.user_agent.clone(),
            ..TransportOptions::default()
        })
    }

    /// Loads the ledger for this run, honoring `force_new_download`, and
    /// refuses an occupied output directory that has no ledger.
    pub fn prepare(&self) -> Result<Option<Ledger>> {
        let force = self.config.force_new_download;
        let ledger = ledger::load(&self.layout, force)?;
        storage::ensure_output_dir_available(&self.layout, ledger.is_some(), force)?;
        Ok(ledger)
    }

    /// Reads the ledger as it is on disk, without any fresh-start handling.
    pub fn read_ledger(&self) -> Result<Option<Ledger>> {
        Ok(Ledger::read(&self.layout.ledger_path())?)
    }

    pub fn pending(&self, ledger: Option<&Ledger>) -> (Vec<u64>, PendingSummary) {
        retry::pending(&self.catalog, ledger, self.range, self.policy())
    }

    /// One download pass over the pending set of `ledger`.
    pub async fn download(
        &self,
        ledger: Option<&Ledger>,
        transport: Arc<dyn Transport>,
        progress: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<(DownloadProgress, PendingSummary)> {
        let (ids, summary) = self.pending(ledger);
        tracing::info!(
            pending = summary.enqueued,
            skipped = summary.skipped,
            out_of_range = summary.out_of_range,
            "pending set ready"
        );
        std::fs::create_dir_all(self.layout.output_dir()).with_context(|| {
            format!("create output dir {}", self.layout.output_dir().display())
        })?;
        let ledger_writer =
            LedgerWriter::open_append(&self.layout.ledger_path(), self.writer_options())?;
        let error_writer =
            LedgerWriter::create_truncated(&self.layout.error_log_path(), self.writer_options())?;
        let ctx = Arc::new(FetchContext::new(
            Arc::clone(&self.catalog),
            self.layout.clone(),
            Arc::new(ledger_writer),
            Arc::new(error_writer),
            transport,
            self.pass_options(),
        ));
        let progress = scheduler::run_download_pass(ctx, ids, progress).await?;
        Ok((progress, summary))
    }

    /// Validation pass over the ledger as it stands on disk.
    pub async fn validate(&self) -> Result<ValidationReport> {
        let ledger = self.read_ledger()?.unwrap_or_default();
        let writer = LedgerWriter::open_append(&self.layout.ledger_path(), self.writer_options())?;
        let catalog = Arc::clone(&self.catalog);
        let layout = self.layout.clone();
        let options = self.validation_options();
        let report = tokio::task::spawn_blocking(move || {
            validate::run_validation(&catalog, &ledger, &layout, &writer, &options)
        })
        .await
        .context("validation worker")??;
        Ok(report)
    }

    /// Download pass (unless `validation_only`) followed by validation.
    pub async fn run(
        &self,
        transport: Arc<dyn Transport>,
        progress: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<RunSummary> {
        let ledger = self.prepare()?;
        let (download, pending) = if self.config.validation_only {
            (None, self.pending(ledger.as_ref()).1)
        } else {
            let (p, s) = self.download(ledger.as_ref(), transport, progress).await?;
            (Some(p), s)
        };
        let report = self.validate().await?;
        Ok(RunSummary {
            download,
            pending,
            report,
        })
    }

    /// Per-status counts of in-range catalog IDs and the size of the next pass.
    pub fn status(&self) -> Result<StatusSummary> {
        let ledger = self.read_ledger()?;
        let mut summary = StatusSummary {
            catalog_size: self.catalog.len(),
            ..Default::default()
        };
        for id in self.catalog.ids().filter(|id| self.range.contains(*id)) {
            summary.in_range += 1;
            match ledger.as_ref().and_then(|l| l.status(id)) {
                Some(status) => *summary.by_status.entry(status).or_default() += 1,
                None => summary.never_attempted += 1,
            }
        }
        summary.pending = self.pending(ledger.as_ref()).1.enqueued;
        Ok(summary)
    }
}
