//! The admission loop of one download pass.

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};

use crate::catalog::ResourceId;
use crate::ledger::{LedgerEntry, OutcomeStatus};
use crate::storage;
use crate::url_model;

use super::context::FetchContext;
use super::error::SchedulerError;
use super::guard::DoneGuard;
use super::progress::DownloadProgress;
use super::registry::TaskRegistry;
use super::slot::TerminalSlot;
use super::task::{run_fetch, FetchTask};

/// Fetches every ID in `ids`, appending one ledger entry per ID.
///
/// Returns once the queue is empty, no fetch is in flight, and (when anything
/// was fetched) one surviving time has passed since the queue ran dry. Per-resource
/// failures are recorded and never end the pass; a writer overflow does, after
/// cancelling and draining whatever is in flight.
pub async fn run_download_pass(
    ctx: Arc<FetchContext>,
    ids: Vec<ResourceId>,
    progress_tx: Option<mpsc::Sender<DownloadProgress>>,
) -> Result<DownloadProgress, SchedulerError> {
    let total = ids.len();
    let mut queue: VecDeque<ResourceId> = ids.into();
    let mut registry = TaskRegistry::new();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<ResourceId>();
    let started = Instant::now();
    let mut last_report = Instant::now();
    let concurrency = ctx.options.concurrency.max(1);
    let mut fatal = None;
    let mut fetches_started = 0usize;
    let mut drain_deadline: Option<Instant> = None;

    tracing::info!(total, concurrency, "download pass started");

    loop {
        while let Ok(id) = done_rx.try_recv() {
            registry.retire(id);
        }

        if fatal.is_none() {
            if let Some(err) = ctx.take_fatal() {
                tracing::warn!(
                    in_flight = registry.len(),
                    abandoned = queue.len(),
                    "stopping admission, cancelling in-flight fetches"
                );
                queue.clear();
                registry.cancel_all();
                fatal = Some(err);
            }
        }

        if last_report.elapsed() >= ctx.options.progress_interval {
            report(&ctx, total, started, progress_tx.as_ref());
            last_report = Instant::now();
        }

        if queue.is_empty() && drain_deadline.is_none() {
            drain_deadline = Some(Instant::now() + ctx.options.surviving_time);
        }

        if queue.is_empty() && registry.is_empty() {
            let grace_over = fatal.is_some()
                || fetches_started == 0
                || drain_deadline.map_or(true, |d| Instant::now() >= d);
            if grace_over {
                break;
            }
        }

        if queue.is_empty() || ctx.counters.in_flight() >= concurrency {
            if let Ok(Some(id)) =
                tokio::time::timeout(ctx.options.idle_interval, done_rx.recv()).await
            {
                registry.retire(id);
            }
            continue;
        }

        let Some(id) = queue.pop_front() else {
            continue;
        };
        if admit(&ctx, id, &mut registry, &done_tx) {
            fetches_started += 1;
        }
    }

    if let Some(err) = fatal.or_else(|| ctx.take_fatal()) {
        for writer in [&ctx.ledger, &ctx.errors] {
            if let Err(e) = writer.flush() {
                tracing::warn!("flush after abort failed: {}", e);
            }
        }
        return Err(err.into());
    }
    ctx.ledger.flush()?;
    ctx.errors.flush()?;
    let summary = snapshot(&ctx, total, started);
    if let Some(tx) = progress_tx.as_ref() {
        let _ = tx.try_send(summary.clone());
    }
    tracing::info!(
        processed = summary.processed,
        success = summary.success,
        timeout = summary.timeout,
        error = summary.error,
        invalid = summary.invalid,
        elapsed_secs = summary.elapsed_secs,
        "download pass finished"
    );
    Ok(summary)
}

/// Resolves one ID and either records it inline or starts its fetch.
/// Returns whether a fetch was handed to the blocking pool.
fn admit(
    ctx: &Arc<FetchContext>,
    id: ResourceId,
    registry: &mut TaskRegistry,
    done_tx: &mpsc::UnboundedSender<ResourceId>,
) -> bool {
    let Some(url) = ctx.catalog.url(id) else {
        tracing::warn!(id, "pending id missing from catalog, skipping");
        return false;
    };
    let relative = url_model::derive_path(id, url, ctx.options.bucket_size);
    let dest = ctx.layout.image_path(&relative);

    if !url_model::is_well_formed(url) {
        ctx.record(LedgerEntry::new(id, OutcomeStatus::InvalidUrl, url, relative));
        return false;
    }
    if let Err(e) = storage::prepare_destination(&dest) {
        tracing::warn!(id, path = %dest.display(), "cannot create bucket directory: {}", e);
        ctx.record(LedgerEntry::new(id, OutcomeStatus::GeneralError, url, relative));
        return false;
    }

    let slot = Arc::new(TerminalSlot::new());
    let cancel = Arc::new(AtomicBool::new(false));
    let (started_tx, started_rx) = oneshot::channel();
    ctx.counters.start();
    registry.arm(
        id,
        Arc::clone(&slot),
        Arc::clone(&cancel),
        ctx.options.surviving_time,
        started_rx,
    );

    let task = FetchTask {
        id,
        url: url.to_string(),
        relative,
        dest,
    };
    let ctx = Arc::clone(ctx);
    let done = done_tx.clone();
    tokio::task::spawn_blocking(move || {
        let _guard = DoneGuard {
            id,
            counters: &ctx.counters,
            done,
        };
        // The budget covers the fetch, not the wait for a free blocking thread.
        let _ = started_tx.send(());
        run_fetch(&ctx, task, &slot, &cancel);
    });
    true
}

fn snapshot(ctx: &FetchContext, total: usize, started: Instant) -> DownloadProgress {
    let c = &ctx.counters;
    DownloadProgress {
        processed: c.processed(),
        total,
        success: c.success(),
        timeout: c.timeout(),
        error: c.error(),
        invalid: c.invalid(),
        in_flight: c.in_flight(),
        elapsed_secs: started.elapsed().as_secs_f64(),
    }
}

fn report(
    ctx: &FetchContext,
    total: usize,
    started: Instant,
    tx: Option<&mpsc::Sender<DownloadProgress>>,
) {
    let p = snapshot(ctx, total, started);
    tracing::info!(in_flight = p.in_flight, "progress {}", p);
    if let Some(tx) = tx {
        let _ = tx.try_send(p);
    }
}
