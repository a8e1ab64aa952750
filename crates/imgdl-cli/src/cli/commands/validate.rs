//! `imgdl validate` – validation pass only.

use anyhow::Result;
use imgdl_core::config::ImgdlConfig;
use imgdl_core::Session;

use super::print_report;
use crate::cli::diagnostic;

pub async fn run_validate(cfg: ImgdlConfig) -> Result<()> {
    let session = Session::open(cfg)?;
    let report = match session.validate().await {
        Ok(report) => report,
        Err(err) => return Err(diagnostic::recorded(session.layout(), err)),
    };
    print_report(&report);
    Ok(())
}
