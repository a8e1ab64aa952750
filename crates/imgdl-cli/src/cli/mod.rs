//! CLI for the imgdl bulk image downloader.

mod commands;
mod diagnostic;
pub mod exit;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use imgdl_core::config::{self, ImgdlConfig};
use imgdl_core::logging;
use std::path::{Path, PathBuf};

use commands::{run_completions, run_download, run_man, run_status, run_validate};

/// Top-level CLI for imgdl.
#[derive(Debug, Parser)]
#[command(name = "imgdl")]
#[command(about = "imgdl: resumable bulk image downloader", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/imgdl/config.toml, created if missing).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Where to read the catalog from and which part of it to work on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct TreeArgs {
    /// URL list, one `URL` or `URL<TAB>ID` per line.
    #[arg(long, value_name = "PATH")]
    pub urls: Option<PathBuf>,
    /// Output directory for the image tree.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// `all` or an inclusive ID range such as `1000-1999`.
    #[arg(long, value_name = "RANGE")]
    pub range: Option<String>,
}

impl TreeArgs {
    fn apply(&self, cfg: &mut ImgdlConfig) {
        if let Some(ref p) = self.urls {
            cfg.url_list = p.clone();
        }
        if let Some(ref p) = self.output {
            cfg.output_dir = p.clone();
        }
        if let Some(ref r) = self.range {
            cfg.image_record_range = r.clone();
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every pending image, then validate the tree.
    Run {
        #[command(flatten)]
        tree: TreeArgs,
        /// Discard the ledger and all reports and start from scratch.
        #[arg(long)]
        force_new: bool,
        /// Re-attempt resources that previously failed (404 or general error).
        #[arg(long)]
        retry_failed: bool,
        /// Validate by existence and size only.
        #[arg(long)]
        fast_validation: bool,
        /// Skip the download pass.
        #[arg(long, conflicts_with = "force_new")]
        validation_only: bool,
        /// Maximum concurrent fetches.
        #[arg(long, value_name = "N")]
        threads: Option<usize>,
    },

    /// Validate the tree against the ledger without downloading.
    Validate {
        #[command(flatten)]
        tree: TreeArgs,
        /// Validate by existence and size only.
        #[arg(long)]
        fast_validation: bool,
        /// Validation worker threads.
        #[arg(long, value_name = "N")]
        threads: Option<usize>,
    },

    /// Summarize the ledger against the catalog.
    Status {
        #[command(flatten)]
        tree: TreeArgs,
        /// Count failed resources as pending.
        #[arg(long)]
        retry_failed: bool,
    },

    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Print the man page.
    Man,
}

fn load_config(path: Option<&Path>) -> Result<ImgdlConfig> {
    let cfg = match path {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_init()?,
    };
    Ok(cfg)
}

/// File logging under `run_log_dir` (or the state dir), falling back to stderr.
fn init_logging(run_log_dir: Option<&Path>) {
    if let Err(e) = logging::init_logging(run_log_dir) {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", e);
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        cli.command.dispatch(cli.config.as_deref()).await
    }

    async fn dispatch(self, config_path: Option<&Path>) -> Result<()> {
        match self {
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man(),
            command => {
                let mut cfg = load_config(config_path);
                if let Ok(cfg) = cfg.as_mut() {
                    command.apply(cfg);
                }
                let run_log_dir = match (&command, &cfg) {
                    (CliCommand::Run { .. } | CliCommand::Validate { .. }, Ok(cfg)) => {
                        Some(cfg.log_dir())
                    }
                    _ => None,
                };
                init_logging(run_log_dir.as_deref());
                let cfg = cfg?;
                tracing::debug!("loaded config: {:?}", cfg);
                match command {
                    CliCommand::Run { .. } => run_download(cfg).await,
                    CliCommand::Validate { .. } => run_validate(cfg).await,
                    CliCommand::Status { .. } => run_status(cfg),
                    CliCommand::Completions { .. } | CliCommand::Man => Ok(()),
                }
            }
        }
    }

    /// Layers command-line flags over the loaded configuration.
    pub fn apply(&self, cfg: &mut ImgdlConfig) {
        match self {
            CliCommand::Run {
                tree,
                force_new,
                retry_failed,
                fast_validation,
                validation_only,
                threads,
            } => {
                tree.apply(cfg);
                cfg.force_new_download |= *force_new;
                cfg.try_failed_download |= *retry_failed;
                cfg.fast_validation |= *fast_validation;
                cfg.validation_only |= *validation_only;
                if let Some(n) = threads {
                    cfg.concurrent_threads = *n;
                }
            }
            CliCommand::Validate {
                tree,
                fast_validation,
                threads,
            } => {
                tree.apply(cfg);
                cfg.fast_validation |= *fast_validation;
                if let Some(n) = threads {
                    cfg.validation_threads = *n;
                }
            }
            CliCommand::Status { tree, retry_failed } => {
                tree.apply(cfg);
                cfg.try_failed_download |= *retry_failed;
            }
            CliCommand::Completions { .. } | CliCommand::Man => {}
        }
    }
}

#[cfg(test)]
mod tests;
