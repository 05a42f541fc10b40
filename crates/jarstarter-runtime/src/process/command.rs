//! Child command construction.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use jarstarter_core::Settings;
use tokio::process::Command;

/// Variables set on the child only, to keep its output free of colour codes.
pub const COLOR_ENV_OVERLAY: &[(&str, &str)] = &[
    ("NO_COLOR", "1"),
    ("CLICOLOR", "0"),
    ("CLICOLOR_FORCE", "0"),
    ("FORCE_COLOR", "0"),
    ("TERM", "dumb"),
    ("SPRING_OUTPUT_ANSI_ENABLED", "NEVER"),
];

/// Everything needed to launch the payload apart from the resolved paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Arguments placed before the payload.
    pub runtime_args: Vec<String>,
    /// Flag introducing the payload path.
    pub payload_flag: Option<String>,
    /// Extra environment variables, applied after the colour overlay.
    pub extra_env: Vec<(String, String)>,
    /// Grace period between terminate and kill.
    pub stop_grace: Duration,
}

impl LaunchSpec {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            runtime_args: settings.runtime_args.clone(),
            payload_flag: settings.payload_flag.clone(),
            extra_env: Vec::new(),
            stop_grace: settings.stop_grace(),
        }
    }

    /// Full argument vector following the runtime executable.
    pub fn args(&self, payload: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.runtime_args.iter().map(OsString::from).collect();
        if let Some(ref flag) = self.payload_flag {
            args.push(flag.into());
        }
        args.push(payload.as_os_str().to_owned());
        args
    }

    /// Build the command with piped output, working directory and env overlay.
    pub fn command(&self, runtime: &Path, payload: &Path, work_dir: &Path) -> Command {
        let mut cmd = Command::new(runtime);
        cmd.args(self.args(payload))
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in COLOR_ENV_OVERLAY {
            cmd.env(key, value);
        }
        for (key, value) in &self.extra_env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl Default for LaunchSpec {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
