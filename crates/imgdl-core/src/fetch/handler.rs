//! Easy2 handler: tracks the final status line, writes 2xx bodies to the
//! destination file, and aborts the transfer once the cancel flag is raised.

use std::fs::File;
use std::io::{self, Write};
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};

use curl::easy::{Handler, WriteError};

pub(super) struct FetchHandler<'a> {
    file: File,
    cancel: &'a AtomicBool,
    /// Status of the most recent response; redirects reset it.
    status: Option<u32>,
    pub(super) bytes_written: u64,
    pub(super) storage_error: Option<io::Error>,
}

impl<'a> FetchHandler<'a> {
    pub(super) fn new(file: File, cancel: &'a AtomicBool) -> Self {
        Self {
            file,
            cancel,
            status: None,
            bytes_written: 0,
            storage_error: None,
        }
    }

    fn body_wanted(&self) -> bool {
        matches!(self.status, Some(code) if (200..300).contains(&code))
    }

    pub(super) fn finish(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Status code from a `HTTP/x.y NNN reason` line.
pub(super) fn parse_status_line(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("HTTP/")?;
    rest.split_whitespace().nth(1)?.parse().ok()
}

impl Handler for FetchHandler<'_> {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            if let Some(code) = parse_status_line(s.trim_end()) {
                self.status = Some(code);
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if !self.body_wanted() {
            return Ok(data.len());
        }
        match self.file.write_all(data) {
            Ok(()) => {
                self.bytes_written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                self.storage_error = Some(e);
                Ok(0)
            }
        }
    }

    fn progress(&mut self, _dltotal: f64, _dlnow: f64, _ultotal: f64, _ulnow: f64) -> bool {
        !self.cancel.load(Ordering::Relaxed)
    }
}
