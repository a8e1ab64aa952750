//! CLI command handlers, one file per command.

mod completions;
mod man;
mod run;
mod status;
mod validate;

pub use completions::run_completions;
pub use man::run_man;
pub use run::run_download;
pub use status::run_status;
pub use validate::run_validate;

use imgdl_core::validate::ValidationReport;

fn print_report(report: &ValidationReport) {
    print!("{}", report.to_text());
    if report.failed > 0 || report.renamed > 0 {
        println!(
            "({} demoted to ValidationFailed, {} extension(s) corrected)",
            report.failed, report.renamed
        );
    }
}
