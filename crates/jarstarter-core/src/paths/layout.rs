//! Resolved on-disk layout of a launcher installation.
//!
//! Everything writable lives under one data root so that tests can point the
//! whole launcher at a temporary directory without touching the environment.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::PathError;
use super::platform::{data_root, resource_root};

/// File name of the append-only launcher log.
pub const LOG_FILE_NAME: &str = "jarstarter.log";

/// File name of the optional JSON configuration, directly under the data root.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Concrete directories and files used by the launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LauncherPaths {
    /// Root for all writable state.
    pub data_root: PathBuf,
    /// Root of the bundled resources (read-only).
    pub resource_root: PathBuf,
    /// Versioned runtime install directory.
    pub runtime_dir: PathBuf,
    /// Directory holding the single cached payload artifact.
    pub payload_dir: PathBuf,
    /// Working directory of the child process.
    pub work_dir: PathBuf,
    /// Directory of the launcher log file.
    pub log_dir: PathBuf,
}

impl LauncherPaths {
    /// Derive the layout from explicit roots.
    pub fn from_roots(
        data_root: impl Into<PathBuf>,
        resource_root: impl Into<PathBuf>,
        runtime_version: &str,
    ) -> Self {
        let data_root = data_root.into();
        Self {
            runtime_dir: data_root.join("runtime").join(runtime_version),
            payload_dir: data_root.join("app"),
            work_dir: data_root.join("work"),
            log_dir: data_root.join("logs"),
            resource_root: resource_root.into(),
            data_root,
        }
    }

    /// Resolve the layout from the platform defaults and environment overrides.
    pub fn resolve(runtime_version: &str) -> Result<Self, PathError> {
        Ok(Self::from_roots(data_root()?, resource_root()?, runtime_version))
    }

    /// Path of the append-only log file.
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    /// Path of the optional JSON configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.data_root.join(CONFIG_FILE_NAME)
    }

    /// Bundled directory holding the runtime tree.
    pub fn runtime_bundle_dir(&self) -> PathBuf {
        self.resource_root.join("embedded-runtime")
    }

    /// Bundled directory holding the payload artifact.
    pub fn payload_bundle_dir(&self) -> PathBuf {
        self.resource_root.join("payload")
    }

    /// Cached payload artifact path for the given file name.
    pub fn payload_file(&self, file_name: &str) -> PathBuf {
        self.payload_dir.join(file_name)
    }

    /// Whether `path` lives under the writable data root.
    pub fn owns(&self, path: &Path) -> bool {
        path.starts_with(&self.data_root)
    }
}
