//! Chronofile - normalize, date and file photo collections from the command line.
//!
//! Without a subcommand an interactive menu is shown.

mod commands;
mod menu;

use anyhow::Result;
use chronofile_core::config::FilingConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "chronofile")]
#[command(about = "Normalize names and file photos by capture date")]
struct Args {
    /// Directory to operate on
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Delete leftover `_filemany.simDB` marker files
    RemoveMarkers,
    /// Count files per extension
    ReportExtensions,
    /// Normalize every file name
    NormalizeFiles,
    /// Normalize every directory name, deepest first
    NormalizeDirs,
    /// Write capture-date reports for all JPEG files
    ReportExif {
        /// Report of photos with a capture date
        #[arg(long, default_value = FilingConfig::CAPTURE_DATE_REPORT)]
        output: PathBuf,
        /// List of photos without a capture date
        #[arg(long, default_value = FilingConfig::MISSING_DATE_REPORT)]
        missing_output: PathBuf,
    },
    /// Prefix JPEG names with their capture date
    DatePrefix,
    /// Move JPEG files into `<target>/YYYY/MM-DD/`
    Organize {
        /// Base directory of the dated tree; relative to the working directory
        #[arg(short, long, default_value = FilingConfig::DEFAULT_TARGET_DIR)]
        target: PathBuf,
    },
    /// Ask a classification service whether paths agree with capture metadata
    Analyze(commands::AnalyzeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    debug!(
        "Root directory: {} (platform: {})",
        args.root.display(),
        chronofile_core::platform::current_platform()
    );

    let command = match args.command {
        Some(command) => command,
        None => match menu::prompt()? {
            Some(command) => command,
            None => {
                println!("Invalid choice.");
                return Ok(());
            }
        },
    };

    commands::run(command, &args.root).await
}
