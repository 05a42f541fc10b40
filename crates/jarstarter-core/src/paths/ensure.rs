//! Writable directory setup for the runtime root, payload cache and work dir.

use std::fs::{self, OpenOptions};
use std::path::Path;

use super::error::PathError;

const WRITE_MARKER: &str = ".jarstarter_write_test";

/// Create `path` (and parents) if missing and check that it accepts new files.
pub fn ensure_writable_dir(path: &Path) -> Result<(), PathError> {
    if path.exists() && !path.is_dir() {
        return Err(PathError::NotADirectory(path.to_path_buf()));
    }
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Created directory");
    }

    let marker = path.join(WRITE_MARKER);
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&marker)
        .map_err(|e| PathError::NotWritable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let _ = fs::remove_file(&marker);
    Ok(())
}
