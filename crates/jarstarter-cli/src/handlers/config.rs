//! Config command handler.

use anyhow::{Context, Result};

use crate::bootstrap::CliContext;

/// Print the effective settings, after file and command-line overrides.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let json = serde_json::to_string_pretty(&ctx.settings).context("Failed to serialize settings")?;
    println!("{json}");
    Ok(())
}
