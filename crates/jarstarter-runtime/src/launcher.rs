//! Start and stop actions as an adapter sees them.
//!
//! Start provisions the runtime and payload (a no-op after the first run) and
//! hands the resulting paths to the supervisor. Stop delegates to the
//! supervisor.

use std::sync::Arc;

use jarstarter_core::{LauncherPaths, StartOutcome, StatusTone};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::error;

use crate::process::{ProcessSupervisor, SupervisorError};
use crate::provision::{ProvisioningError, ResourceProvisioner};
use crate::status::StatusStore;

/// Error from a launcher action.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    /// The blocking provisioning task was cancelled or panicked.
    #[error("Provisioning task failed: {0}")]
    Task(String),
}

/// Provisioner and supervisor wired to one data root.
pub struct Launcher {
    paths: LauncherPaths,
    provisioner: Arc<ResourceProvisioner>,
    provisioning: Mutex<()>,
    supervisor: ProcessSupervisor,
}

impl Launcher {
    pub fn new(
        paths: LauncherPaths,
        provisioner: ResourceProvisioner,
        supervisor: ProcessSupervisor,
    ) -> Self {
        Self {
            paths,
            provisioner: Arc::new(provisioner),
            provisioning: Mutex::new(()),
            supervisor,
        }
    }

    /// Provision if needed, then start the payload.
    ///
    /// Concurrent calls provision one at a time; only the first one extracts.
    pub async fn start(&self) -> Result<StartOutcome, LaunchError> {
        let provisioned = {
            let _provisioning = self.provisioning.lock().await;
            let provisioner = Arc::clone(&self.provisioner);
            tokio::task::spawn_blocking(move || provisioner.provision_all())
                .await
                .map_err(|e| LaunchError::Task(e.to_string()))
                .and_then(|result| result.map_err(LaunchError::from))
        };

        let (runtime, payload) = match provisioned {
            Ok(resources) => resources,
            Err(e) => {
                error!(error = %e, "Provisioning failed");
                self.store()
                    .set_with_tone(format!("Start failed: {e}"), false, StatusTone::Error);
                return Err(e);
            }
        };

        Ok(self
            .supervisor
            .start(
                &runtime.executable_path,
                &payload.artifact_path,
                &self.paths.work_dir,
            )
            .await?)
    }

    /// Stop the payload and health polling.
    pub async fn stop(&self) -> Result<(), LaunchError> {
        Ok(self.supervisor.stop().await?)
    }

    pub const fn paths(&self) -> &LauncherPaths {
        &self.paths
    }

    pub fn provisioner(&self) -> &ResourceProvisioner {
        &self.provisioner
    }

    pub const fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        self.supervisor.store()
    }
}
