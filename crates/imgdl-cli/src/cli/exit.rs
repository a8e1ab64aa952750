//! Process exit codes by error category.

use imgdl_core::catalog::CatalogError;
use imgdl_core::config::ConfigError;
use imgdl_core::storage::OutputDirInUse;

/// Configuration, catalog, or output-directory problems found before any work.
pub const EXIT_SETUP: i32 = 2;
/// Unrecoverable runtime failure (ledger corruption, buffer overflow, I/O).
pub const EXIT_RUNTIME: i32 = 3;

pub fn exit_code(err: &anyhow::Error) -> i32 {
    let setup = err.chain().any(|cause| {
        cause.is::<ConfigError>() || cause.is::<CatalogError>() || cause.is::<OutputDirInUse>()
    });
    if setup {
        EXIT_SETUP
    } else {
        EXIT_RUNTIME
    }
}
