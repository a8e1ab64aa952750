//! Ledger replay and writer tests.

use super::*;
use crate::storage::OutputLayout;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn entry(id: u64, status: OutcomeStatus) -> LedgerEntry {
    LedgerEntry::new(id, status, format!("http://x/{}.jpg", id), format!("0/{}.jpg", id))
}

#[test]
fn replay_keeps_latest_status_per_id() {
    let text = "1\tTimeOut\thttp://x/1.jpg\t0/1.jpg\n\
                2\tGeneralError\thttp://x/2.jpg\t0/2.jpg\n\
                1\tSuccess\thttp://x/1.jpg\t0/1.jpg\n";
    let ledger = Ledger::from_text(text, Path::new("log")).unwrap();
    assert_eq!(ledger.status(1), Some(OutcomeStatus::Success));
    assert_eq!(ledger.status(2), Some(OutcomeStatus::GeneralError));
    assert_eq!(ledger.status(3), None);
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.rows(), 3);
}

#[test]
fn replaying_a_duplicate_entry_is_idempotent() {
    let once = entry(5, OutcomeStatus::TimeOut).to_line();
    let twice = format!("{once}{once}");
    let a = Ledger::from_text(&once, Path::new("log")).unwrap();
    let b = Ledger::from_text(&twice, Path::new("log")).unwrap();
    assert_eq!(a.statuses(), b.statuses());
    assert_eq!(a.get(5), b.get(5));
}

#[test]
fn partial_trailing_row_is_ignored() {
    let text = "1\tSuccess\thttp://x/1.jpg\t0/1.jpg\n2\tSucc";
    let ledger = Ledger::from_text(text, Path::new("log")).unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.status(2), None);
}

#[test]
fn blank_rows_and_crlf_are_tolerated() {
    let text = "\n1\tSuccess\thttp://x/1.jpg\t0/1.jpg\r\n\n";
    let ledger = Ledger::from_text(text, Path::new("log")).unwrap();
    assert_eq!(ledger.status(1), Some(OutcomeStatus::Success));
}

#[test]
fn corrupt_row_names_its_line() {
    let text = "1\tSuccess\thttp://x/1.jpg\t0/1.jpg\ngarbage row\n3\tSuccess\thttp://x/3.jpg\n";
    match Ledger::from_text(text, Path::new("ledger.tsv")) {
        Err(LedgerError::Corrupt { line, content, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(content, "garbage row");
        }
        other => panic!("expected corrupt ledger, got {:?}", other),
    }
}

#[test]
fn load_missing_ledger_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path(), dir.path().join("logs"));
    assert!(load(&layout, false).unwrap().is_none());
}

#[test]
fn load_with_force_fresh_discards_everything() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path(), dir.path().join("logs"));
    {
        let w = LedgerWriter::open_append(&layout.ledger_path(), WriterOptions::default()).unwrap();
        w.append(entry(1, OutcomeStatus::Success)).unwrap();
    }
    std::fs::write(layout.report_path(), "TotalImageProcessed=1\n").unwrap();
    assert!(load(&layout, false).unwrap().is_some());
    assert!(load(&layout, true).unwrap().is_none());
    assert!(!layout.ledger_path().exists());
    assert!(!layout.report_path().exists());
}

#[test]
fn crash_recovery_reattempts_missing_and_skips_success() {
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path(), dir.path().join("logs"));
    std::fs::create_dir_all(layout.log_dir()).unwrap();
    // Crash while writing the row for 7: only a torn prefix made it to disk.
    std::fs::write(
        layout.ledger_path(),
        "8\tSuccess\thttp://x/8.jpg\t0/8.jpg\n7\tSucc",
    )
    .unwrap();
    let ledger = load(&layout, false).unwrap().unwrap();
    assert_eq!(ledger.status(7), None);
    assert_eq!(ledger.status(8), Some(OutcomeStatus::Success));
}

#[test]
fn writer_appends_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("download_log.tsv");
    {
        let w = LedgerWriter::open_append(&path, WriterOptions::default()).unwrap();
        w.append(entry(1, OutcomeStatus::TimeOut)).unwrap();
        assert_eq!(w.pending(), 0, "threshold 1 writes immediately");
    }
    {
        let w = LedgerWriter::open_append(&path, WriterOptions::default()).unwrap();
        w.append(entry(1, OutcomeStatus::Success)).unwrap();
    }
    let ledger = Ledger::read(&path).unwrap().unwrap();
    assert_eq!(ledger.rows(), 2);
    assert_eq!(ledger.status(1), Some(OutcomeStatus::Success));
}

#[test]
fn reopening_after_a_torn_row_keeps_the_ledger_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download_log.tsv");
    std::fs::write(&path, "1\tSuccess\thttp://x/1.jpg\t0/1.jpg\n2\tSucc").unwrap();
    {
        let w = LedgerWriter::open_append(&path, WriterOptions::default()).unwrap();
        w.append(entry(2, OutcomeStatus::Success)).unwrap();
    }
    let ledger = Ledger::read(&path).unwrap().unwrap();
    assert_eq!(ledger.rows(), 2);
    assert_eq!(ledger.status(1), Some(OutcomeStatus::Success));
    assert_eq!(ledger.status(2), Some(OutcomeStatus::Success));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("Succ2"));
}

#[test]
fn torn_single_row_is_cut_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download_log.tsv");
    std::fs::write(&path, "4\tTime").unwrap();
    {
        let w = LedgerWriter::open_append(&path, WriterOptions::default()).unwrap();
        w.append(entry(4, OutcomeStatus::TimeOut)).unwrap();
    }
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, entry(4, OutcomeStatus::TimeOut).to_line());
}

#[test]
fn truncated_writer_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("errors.tsv");
    std::fs::write(&path, "old contents\n").unwrap();
    let w = LedgerWriter::create_truncated(&path, WriterOptions::default()).unwrap();
    w.append(entry(2, OutcomeStatus::GeneralError)).unwrap();
    drop(w);
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, entry(2, OutcomeStatus::GeneralError).to_line());
}

#[test]
fn batched_writer_holds_entries_until_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.tsv");
    let opts = WriterOptions {
        flush_threshold: 3,
        queue_limit: 10,
    };
    let w = LedgerWriter::open_append(&path, opts).unwrap();
    w.append(entry(1, OutcomeStatus::Success)).unwrap();
    w.append(entry(2, OutcomeStatus::Success)).unwrap();
    assert_eq!(w.pending(), 2);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    w.append(entry(3, OutcomeStatus::Success)).unwrap();
    assert_eq!(w.pending(), 0);
    w.append(entry(4, OutcomeStatus::Success)).unwrap();
    w.flush().unwrap();
    assert_eq!(Ledger::read(&path).unwrap().unwrap().len(), 4);
}

/// Sink that fails its first `failures` writes, then records everything.
struct FlakySink {
    failures: Arc<AtomicUsize>,
    data: Arc<Mutex<Vec<u8>>>,
}

impl Write for FlakySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(io::Error::new(io::ErrorKind::Other, "disk hiccup"));
        }
        self.data.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn failed_write_requeues_instead_of_dropping() {
    let failures = Arc::new(AtomicUsize::new(2));
    let data = Arc::new(Mutex::new(Vec::new()));
    let sink = FlakySink {
        failures: Arc::clone(&failures),
        data: Arc::clone(&data),
    };
    let w = LedgerWriter::from_writer(Path::new("mem"), Box::new(sink), WriterOptions::default());
    w.append(entry(1, OutcomeStatus::Success)).unwrap();
    w.append(entry(2, OutcomeStatus::TimeOut)).unwrap();
    assert_eq!(w.pending(), 2, "both entries still queued after two failed writes");
    w.append(entry(3, OutcomeStatus::Success)).unwrap();
    assert_eq!(w.pending(), 0);

    let text = String::from_utf8(data.lock().unwrap().clone()).unwrap();
    let ledger = Ledger::from_text(&text, Path::new("mem")).unwrap();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.status(2), Some(OutcomeStatus::TimeOut));
}

#[test]
fn stuck_sink_overflows_the_queue() {
    let failures = Arc::new(AtomicUsize::new(usize::MAX));
    let sink = FlakySink {
        failures,
        data: Arc::new(Mutex::new(Vec::new())),
    };
    let opts = WriterOptions {
        flush_threshold: 1,
        queue_limit: 3,
    };
    let w = LedgerWriter::from_writer(Path::new("mem"), Box::new(sink), opts);
    for id in 0..3 {
        w.append(entry(id, OutcomeStatus::Success)).unwrap();
    }
    match w.append(entry(3, OutcomeStatus::Success)) {
        Err(LedgerError::BufferOverflow { pending, limit, .. }) => {
            assert_eq!(pending, 4);
            assert_eq!(limit, 3);
        }
        other => panic!("expected overflow, got {:?}", other),
    }
}

#[test]
fn concurrent_appends_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.tsv");
    let w = Arc::new(LedgerWriter::open_append(&path, WriterOptions::default()).unwrap());
    let threads: Vec<_> = (0..8u64)
        .map(|t| {
            let w = Arc::clone(&w);
            std::thread::spawn(move || {
                for i in 0..250u64 {
                    w.append(entry(t * 1000 + i, OutcomeStatus::Success)).unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    w.flush().unwrap();
    assert_eq!(w.written(), 2000);
    let ledger = Ledger::read(&path).unwrap().unwrap();
    assert_eq!(ledger.len(), 2000);
    assert_eq!(ledger.rows(), 2000);
}
