mod cli;

use crate::cli::{exit, CliCommand};

#[tokio::main]
async fn main() {
    // Logging is installed once the command knows its log directory.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("imgdl error: {:#}", err);
        std::process::exit(exit::exit_code(&err));
    }
}
