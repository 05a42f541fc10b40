//! Mapping from failures to process exit codes.

use jarstarter_core::{PathError, SettingsError};
use jarstarter_runtime::{LaunchError, ProvisioningError, SupervisorError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Nothing to show.
    #[error("Log file {0} does not exist yet")]
    NoLog(String),
}

/// Exit code for an error chain.
///
/// Exit codes follow sysexits.h where one fits:
/// - 1: General error
/// - 66: Input missing (log file, payload)
/// - 71: OS error (spawn, terminate)
/// - 73: Cannot create output (directories, extraction)
/// - 78: Configuration error
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<LaunchError>() {
            return match e {
                LaunchError::Provisioning(p) => provisioning_code(p),
                LaunchError::Supervisor(s) => supervisor_code(s),
                LaunchError::Task(_) => 1,
            };
        }
        if let Some(e) = cause.downcast_ref::<ProvisioningError>() {
            return provisioning_code(e);
        }
        if let Some(e) = cause.downcast_ref::<SupervisorError>() {
            return supervisor_code(e);
        }
        if cause.downcast_ref::<SettingsError>().is_some() {
            return 78;
        }
        if cause.downcast_ref::<PathError>().is_some() {
            return 73;
        }
        if cause.downcast_ref::<CliError>().is_some() {
            return 66;
        }
    }
    1
}

const fn provisioning_code(err: &ProvisioningError) -> u8 {
    match err {
        ProvisioningError::PayloadNotFound { .. } | ProvisioningError::EntryMissing { .. } => 66,
        _ => 73,
    }
}

const fn supervisor_code(err: &SupervisorError) -> u8 {
    match err {
        SupervisorError::MissingPath(_) => 66,
        SupervisorError::WorkDir(_) => 73,
        SupervisorError::Spawn { .. } | SupervisorError::Terminate(_) => 71,
    }
}
