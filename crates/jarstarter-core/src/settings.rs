//! Launcher settings and validation.
//!
//! Settings are plain data. They are read from an optional `config.json` in
//! the data root; every field has a default, so a missing or partial file is
//! fine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default loopback port of the payload's service.
pub const DEFAULT_HEALTH_PORT: u16 = 10001;

/// Default seconds between two health probes.
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 2;

/// Default connect timeout of a single health probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 300;

/// Default grace period between terminate and kill.
pub const DEFAULT_STOP_GRACE_SECS: u64 = 5;

/// Launcher settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Host the health probe connects to.
    pub health_host: String,
    /// Port the health probe connects to.
    pub health_port: u16,
    /// Seconds between probes.
    pub probe_interval_secs: u64,
    /// Connect timeout of one probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Seconds to wait for graceful exit before killing the child.
    pub stop_grace_secs: u64,

    /// Versioned folder name of the runtime install.
    pub runtime_version: String,
    /// Entry executable, relative to the runtime root.
    pub runtime_entry: String,
    /// File suffixes marked executable during runtime extraction.
    pub executable_suffixes: Vec<String>,

    /// File name of the payload artifact (bundle and cache).
    pub payload_file_name: String,
    /// Development-build location tried when the bundle lacks the payload.
    pub dev_payload_path: Option<PathBuf>,

    /// Arguments passed to the runtime before the payload.
    pub runtime_args: Vec<String>,
    /// Flag introducing the payload path (e.g. `-jar`).
    pub payload_flag: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            health_host: "127.0.0.1".to_string(),
            health_port: DEFAULT_HEALTH_PORT,
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            stop_grace_secs: DEFAULT_STOP_GRACE_SECS,
            runtime_version: "jdk1.8.0_202".to_string(),
            runtime_entry: default_runtime_entry().to_string(),
            executable_suffixes: vec![".exe".to_string(), ".sh".to_string()],
            payload_file_name: "myJar.jar".to_string(),
            dev_payload_path: Some(PathBuf::from("target/myJar.jar")),
            runtime_args: vec![
                "-Dfile.encoding=UTF-8".to_string(),
                "-Dspring.output.ansi.enabled=NEVER".to_string(),
            ],
            payload_flag: Some("-jar".to_string()),
        }
    }
}

#[cfg(target_os = "windows")]
const fn default_runtime_entry() -> &'static str {
    "bin/java.exe"
}

#[cfg(not(target_os = "windows"))]
const fn default_runtime_entry() -> &'static str {
    "bin/java"
}

impl Settings {
    /// Interval between health probes.
    #[must_use]
    pub const fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    /// Connect timeout of a single probe.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Grace period before a stop escalates to kill.
    #[must_use]
    pub const fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }

    /// Load settings from a JSON file, falling back to defaults when absent.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Apply overrides, only updating fields that are `Some`.
    pub fn merge(&mut self, overrides: &SettingsOverrides) {
        if let Some(ref host) = overrides.health_host {
            self.health_host.clone_from(host);
        }
        if let Some(port) = overrides.health_port {
            self.health_port = port;
        }
        if let Some(secs) = overrides.probe_interval_secs {
            self.probe_interval_secs = secs;
        }
        if let Some(secs) = overrides.stop_grace_secs {
            self.stop_grace_secs = secs;
        }
    }
}

/// Partial settings supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub health_host: Option<String>,
    pub health_port: Option<u16>,
    pub probe_interval_secs: Option<u64>,
    pub stop_grace_secs: Option<u64>,
}

/// Settings loading and validation error.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Health port must be non-zero")]
    InvalidPort,

    #[error("Probe interval must be at least 1 second, got {0}")]
    InvalidInterval(u64),

    #[error("Probe timeout must be between 1 and {max} ms and shorter than the interval, got {got}")]
    InvalidProbeTimeout { got: u64, max: u64 },

    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.health_port == 0 {
        return Err(SettingsError::InvalidPort);
    }

    if settings.probe_interval_secs == 0 {
        return Err(SettingsError::InvalidInterval(0));
    }

    let max = settings.probe_interval_secs * 1000;
    if settings.probe_timeout_ms == 0 || settings.probe_timeout_ms >= max {
        return Err(SettingsError::InvalidProbeTimeout {
            got: settings.probe_timeout_ms,
            max,
        });
    }

    if settings.health_host.trim().is_empty() {
        return Err(SettingsError::Empty("health_host"));
    }
    if settings.runtime_version.trim().is_empty() {
        return Err(SettingsError::Empty("runtime_version"));
    }
    if settings.runtime_entry.trim().is_empty() {
        return Err(SettingsError::Empty("runtime_entry"));
    }
    if settings.payload_file_name.trim().is_empty() {
        return Err(SettingsError::Empty("payload_file_name"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.health_port, DEFAULT_HEALTH_PORT);
        assert_eq!(settings.probe_interval(), Duration::from_secs(2));
        assert_eq!(settings.probe_timeout(), Duration::from_millis(300));
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::load(&tmp.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "health_port": 18080, "payload_file_name": "svc.jar" }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.health_port, 18080);
        assert_eq!(settings.payload_file_name, "svc.jar");
        assert_eq!(settings.probe_interval_secs, DEFAULT_PROBE_INTERVAL_SECS);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Settings::load(&path), Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn test_probe_timeout_must_fit_interval() {
        let settings = Settings {
            probe_interval_secs: 1,
            probe_timeout_ms: 1500,
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidProbeTimeout { got: 1500, max: 1000 })
        ));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let settings = Settings {
            probe_interval_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidInterval(0))
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let mut settings = Settings::default();
        settings.merge(&SettingsOverrides {
            health_port: Some(9000),
            probe_interval_secs: Some(5),
            ..Default::default()
        });

        assert_eq!(settings.health_port, 9000);
        assert_eq!(settings.probe_interval_secs, 5);
        assert_eq!(settings.health_host, "127.0.0.1");
    }
}
