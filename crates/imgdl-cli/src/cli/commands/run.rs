//! `imgdl run` – download pass followed by validation.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use imgdl_core::config::ImgdlConfig;
use imgdl_core::fetch::Transport;
use imgdl_core::scheduler::DownloadProgress;
use imgdl_core::Session;

use super::print_report;
use crate::cli::diagnostic;

const PROGRESS_INTERVAL_MS: u128 = 500;

pub async fn run_download(cfg: ImgdlConfig) -> Result<()> {
    let session = Session::open(cfg)?;
    let s = session.catalog().stats();
    println!(
        "catalog: {} images ({} duplicate urls, {} duplicate ids dropped)",
        session.catalog().len(),
        s.duplicate_urls,
        s.duplicate_ids + s.evicted_by_id
    );

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<DownloadProgress>(16);
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(p) = progress_rx.recv().await {
            if last_print.elapsed().as_millis() >= PROGRESS_INTERVAL_MS || p.is_done() {
                println!(
                    "\r  {} ({:.1}%)  {:.1}/s  in flight {}  ",
                    p,
                    p.fraction() * 100.0,
                    p.rate(),
                    p.in_flight
                );
                last_print = Instant::now();
            }
        }
    });

    let transport: Arc<dyn Transport> = Arc::new(session.curl_transport());
    let result = session.run(transport, Some(progress_tx)).await;
    let _ = progress_handle.await;

    let summary = match result {
        Ok(summary) => summary,
        Err(err) => return Err(diagnostic::recorded(session.layout(), err)),
    };
    match summary.download {
        Some(p) => println!(
            "download: {} processed, {} ok, {} timed out, {} failed, {} invalid url",
            p.processed, p.success, p.timeout, p.error, p.invalid
        ),
        None => println!("download skipped (validation only)"),
    }
    print_report(&summary.report);
    Ok(())
}
