//! libcurl-backed [`Transport`].

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use curl::easy::Easy2;

use super::error::FetchError;
use super::handler::FetchHandler;
use super::Transport;

#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    pub user_agent: Option<String>,
    pub max_redirections: u32,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            user_agent: None,
            max_redirections: 10,
        }
    }
}

/// One blocking GET per fetch. No wall-clock timeout is set on the handle:
/// the scheduler owns the time budget and cancels through the progress callback.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: TransportOptions,
}

impl CurlTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }
}

impl Transport for CurlTransport {
    fn fetch(&self, url: &str, dest: &Path, cancel: &AtomicBool) -> Result<u64, FetchError> {
        if cancel.load(Ordering::Relaxed) {
            return Err(FetchError::Cancelled);
        }
        let file = File::create(dest)?;
        let mut easy = Easy2::new(FetchHandler::new(file, cancel));
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.options.max_redirections)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.progress(true)?;
        if let Some(ref ua) = self.options.user_agent {
            easy.useragent(ua)?;
        }

        if let Err(e) = easy.perform() {
            if e.is_aborted_by_callback() || cancel.load(Ordering::Relaxed) {
                return Err(FetchError::Cancelled);
            }
            if e.is_write_error() {
                if let Some(io_err) = easy.get_mut().storage_error.take() {
                    return Err(FetchError::Storage(io_err));
                }
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            tracing::debug!(url, code, "non-success response");
            return Err(FetchError::Http(code));
        }
        let handler = easy.get_mut();
        handler.finish()?;
        Ok(handler.bytes_written)
    }
}
