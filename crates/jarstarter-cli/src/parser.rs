//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface of the launcher.
#[derive(Parser)]
#[command(name = "jarstarter")]
#[command(about = "Provision, launch and watch a bundled Java application")]
#[command(version)]
pub struct Cli {
    /// Override the data directory for this invocation
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the bundled resources directory
    #[arg(long = "resource-dir", global = true)]
    pub resource_dir: Option<PathBuf>,

    /// Port the health probe connects to
    #[arg(long, global = true, env = "JARSTARTER_PORT")]
    pub port: Option<u16>,

    /// Seconds between health probes
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
