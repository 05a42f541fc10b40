//! Logs command handler: print or export the launcher log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jarstarter_core::paths::LOG_FILE_NAME;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub fn execute(ctx: &CliContext, tail: Option<usize>, export: Option<&Path>) -> Result<()> {
    let log_file = ctx.paths.log_file();
    if !log_file.is_file() {
        return Err(CliError::NoLog(log_file.display().to_string()).into());
    }

    if let Some(dest) = export {
        let written = export_log(&log_file, dest)
            .with_context(|| format!("Failed to export log to {}", dest.display()))?;
        info!(dest = %written.display(), "Log exported");
        println!("Log exported to {}", written.display());
        return Ok(());
    }

    let content = fs::read(&log_file)
        .with_context(|| format!("Failed to read {}", log_file.display()))?;
    let content = String::from_utf8_lossy(&content);
    for line in last_lines(&content, tail) {
        println!("{line}");
    }
    Ok(())
}

/// Copy the log to `dest`. A directory destination keeps the log's name.
pub fn export_log(source: &Path, dest: &Path) -> io::Result<PathBuf> {
    let target = if dest.is_dir() {
        dest.join(source.file_name().unwrap_or(LOG_FILE_NAME.as_ref()))
    } else {
        dest.to_path_buf()
    };
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, &target)?;
    Ok(target)
}

/// The last `n` lines of `content`, or all of them.
pub fn last_lines(content: &str, n: Option<usize>) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    match n {
        Some(n) if n < lines.len() => lines[lines.len() - n..].to_vec(),
        _ => lines,
    }
}
