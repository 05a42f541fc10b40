//! Results of resource provisioning.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Runtime extracted onto local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedRuntime {
    /// Absolute path of the runtime entry executable.
    pub executable_path: PathBuf,
    pub ready: bool,
    /// `false` when an existing installation was reused.
    pub extracted: bool,
}

/// Where the cached payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadSource {
    /// A previous extraction was reused.
    Cached,
    /// Copied out of the resource bundle.
    Bundle,
    /// Copied from the development build output.
    DevFallback,
}

impl fmt::Display for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached => write!(f, "cache"),
            Self::Bundle => write!(f, "bundle"),
            Self::DevFallback => write!(f, "development build"),
        }
    }
}

/// Payload artifact extracted onto local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedPayload {
    /// Absolute path of the cached artifact.
    pub artifact_path: PathBuf,
    pub ready: bool,
    pub source: PayloadSource,
}
