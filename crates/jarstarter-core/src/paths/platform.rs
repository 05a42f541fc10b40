//! Platform-specific root directory resolution.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "JARSTARTER_DATA_DIR";

/// Environment variable overriding the bundled resource root.
pub const RESOURCE_DIR_ENV: &str = "JARSTARTER_RESOURCE_DIR";

/// Get the root directory for writable launcher state.
///
/// Resolution order:
/// 1. `JARSTARTER_DATA_DIR` environment variable (highest priority)
/// 2. System local data directory (e.g., `~/.local/share/jarstarter`)
///
/// The directory is not created here; callers decide when to touch disk.
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("jarstarter"))
}

/// Get the root directory holding the bundled resources.
///
/// Resolution order:
/// 1. `JARSTARTER_RESOURCE_DIR` environment variable
/// 2. `resources/` next to the running executable
pub fn resource_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(RESOURCE_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }

    let exe = env::current_exe().map_err(|e| PathError::NoExecutableDir(e.to_string()))?;
    let dir = exe
        .parent()
        .ok_or_else(|| PathError::NoExecutableDir(exe.display().to_string()))?;
    Ok(dir.join("resources"))
}
