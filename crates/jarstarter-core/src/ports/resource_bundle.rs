//! Bundled resource access port.
//!
//! A bundle is a read-only tree of resources shipped with the launcher.
//! Directories are described by manifests: one entry per line, sub-directories
//! marked by a trailing `/`.

use std::io::{self, Read};

/// Read-only access to bundled resources.
///
/// Paths are `/`-separated and relative to the bundle root; the empty string
/// denotes the root directory.
pub trait ResourceBundle: Send + Sync {
    /// Human-readable location for log messages.
    fn describe(&self) -> String;

    /// Manifest lines of a directory, or `None` if the directory is not bundled.
    fn list(&self, dir: &str) -> io::Result<Option<Vec<String>>>;

    /// Open a bundled file, or `None` if it is not bundled.
    fn open(&self, path: &str) -> io::Result<Option<Box<dyn Read + Send>>>;
}
