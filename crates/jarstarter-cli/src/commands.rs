//! Available subcommands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the application and report its status until interrupted
    Run {
        /// Do not provision; fail if the runtime or payload is missing
        #[arg(long)]
        no_provision: bool,
    },

    /// Extract the bundled runtime and payload without launching
    Provision,

    /// Show resolved paths for all jarstarter directories
    Paths,

    /// Print the effective settings as JSON
    Config,

    /// Print the address other machines can reach the application on
    Address,

    /// Show or export the launcher log
    Logs {
        /// Only print the last N lines
        #[arg(long)]
        tail: Option<usize>,
        /// Copy the log file to this path instead of printing it
        #[arg(long)]
        export: Option<PathBuf>,
    },
}
