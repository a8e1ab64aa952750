//! `imgdl status` – ledger summary against the catalog.

use anyhow::Result;
use imgdl_core::config::ImgdlConfig;
use imgdl_core::ledger::OutcomeStatus;
use imgdl_core::Session;

pub fn run_status(cfg: ImgdlConfig) -> Result<()> {
    let session = Session::open(cfg)?;
    let s = session.status()?;
    println!("{:<18} {}", "catalog", s.catalog_size);
    println!("{:<18} {}", "in range", s.in_range);
    println!("{:<18} {}", "never attempted", s.never_attempted);
    for status in OutcomeStatus::ALL {
        let n = s.by_status.get(&status).copied().unwrap_or(0);
        println!("{:<18} {}", status.as_str(), n);
    }
    println!("{:<18} {}", "pending", s.pending);
    Ok(())
}
