//! Command-line adapter for jarstarter.
//!
//! The binary in `main.rs` is the composition root; everything here is
//! exposed as a library so it can be tested.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use error::{CliError, exit_code};
pub use logging::init_tracing;
pub use parser::Cli;
