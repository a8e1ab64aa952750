//! In-process transport driven by a script of per-URL responses.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use imgdl_core::fetch::{FetchError, Transport};

/// curl's "operation timed out" code.
const CURLE_OPERATION_TIMEDOUT: u32 = 28;

#[derive(Default)]
pub struct ScriptedTransport {
    bodies: HashMap<String, Vec<u8>>,
    /// URLs currently answering with a transport timeout.
    stalled: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn stall(&self, url: &str) {
        self.stalled.lock().unwrap().insert(url.to_string());
    }

    pub fn recover(&self, url: &str) {
        self.stalled.lock().unwrap().remove(url);
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Transport for ScriptedTransport {
    fn fetch(&self, url: &str, dest: &Path, _cancel: &AtomicBool) -> Result<u64, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        std::fs::File::create(dest)?;
        if self.stalled.lock().unwrap().contains(url) {
            return Err(FetchError::Curl(curl::Error::new(CURLE_OPERATION_TIMEDOUT)));
        }
        match self.bodies.get(url) {
            Some(body) => {
                std::fs::write(dest, body)?;
                Ok(body.len() as u64)
            }
            None => Err(FetchError::Http(404)),
        }
    }
}
