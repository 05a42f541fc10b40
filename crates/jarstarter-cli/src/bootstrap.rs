//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Data and resource roots (flags, environment, platform defaults)
//! - Settings (`config.json` plus command-line overrides)
//! - Provisioner, status store, log sink and supervisor (via jarstarter-runtime)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use jarstarter_core::paths::{CONFIG_FILE_NAME, data_root, resource_root};
use jarstarter_core::ports::{LogSinkPort, StatusDispatcher};
use jarstarter_core::{LauncherPaths, Settings, SettingsOverrides, validate_settings};
use jarstarter_runtime::{
    Launcher, ProcessSupervisor, ResourceProvisioner, StatusStore, TracingLogSink,
};

use crate::parser::Cli;

/// Bootstrap configuration taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Data root override.
    pub data_dir: Option<PathBuf>,
    /// Resource root override.
    pub resource_dir: Option<PathBuf>,
    /// Settings overrides.
    pub overrides: SettingsOverrides,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            resource_dir: cli.resource_dir.clone(),
            overrides: SettingsOverrides {
                health_port: cli.port,
                probe_interval_secs: cli.interval,
                ..SettingsOverrides::default()
            },
        }
    }
}

/// Resolved layout and settings shared by all commands.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub paths: LauncherPaths,
    pub settings: Settings,
}

impl CliContext {
    /// Provisioner reading from the resource root.
    pub fn provisioner(&self) -> ResourceProvisioner {
        ResourceProvisioner::from_layout(&self.paths, &self.settings)
    }

    /// Launcher whose status writes go to `dispatcher`.
    pub fn launcher(&self, dispatcher: Arc<dyn StatusDispatcher>) -> Launcher {
        let store = Arc::new(StatusStore::with_dispatcher(dispatcher));
        let sink: Arc<dyn LogSinkPort> = Arc::new(TracingLogSink);
        let supervisor = ProcessSupervisor::new(&self.settings, store, sink);
        Launcher::new(self.paths.clone(), self.provisioner(), supervisor)
    }
}

/// Resolve paths and load settings.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext> {
    let data = match config.data_dir {
        Some(ref dir) => dir.clone(),
        None => data_root().context("Cannot determine data directory")?,
    };
    let resources = match config.resource_dir {
        Some(ref dir) => dir.clone(),
        None => resource_root().context("Cannot determine resource directory")?,
    };

    let config_path = data.join(CONFIG_FILE_NAME);
    let mut settings = Settings::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    settings.merge(&config.overrides);
    validate_settings(&settings).context("Invalid command-line override")?;

    let paths = LauncherPaths::from_roots(data, resources, &settings.runtime_version);
    Ok(CliContext { paths, settings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config(tmp: &tempfile::TempDir) -> CliConfig {
        CliConfig {
            data_dir: Some(tmp.path().join("data")),
            resource_dir: Some(tmp.path().join("resources")),
            overrides: SettingsOverrides::default(),
        }
    }

    #[test]
    fn explicit_roots_are_used() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = bootstrap(&config(&tmp)).unwrap();

        assert_eq!(ctx.paths.data_root, tmp.path().join("data"));
        assert_eq!(ctx.paths.runtime_bundle_dir(), tmp.path().join("resources/embedded-runtime"));
        assert_eq!(ctx.settings, Settings::default());
    }

    #[test]
    fn overrides_win_over_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join(CONFIG_FILE_NAME), r#"{ "health_port": 18080 }"#).unwrap();

        let mut cfg = config(&tmp);
        assert_eq!(bootstrap(&cfg).unwrap().settings.health_port, 18080);

        cfg.overrides.health_port = Some(19090);
        assert_eq!(bootstrap(&cfg).unwrap().settings.health_port, 19090);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config(&tmp);
        cfg.overrides.probe_interval_secs = Some(0);
        assert!(bootstrap(&cfg).is_err());
    }
}
