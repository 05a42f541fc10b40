//! Path utilities for jarstarter data directories and bundled resources.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod ensure;
mod error;
mod layout;
mod platform;

pub use ensure::ensure_writable_dir;
pub use error::PathError;
pub use layout::{CONFIG_FILE_NAME, LOG_FILE_NAME, LauncherPaths};
pub use platform::{DATA_DIR_ENV, RESOURCE_DIR_ENV, data_root, resource_root};
