//! Supervisor owning the single payload child process.
//!
//! The supervisor keeps its state behind an async mutex, so start and stop are
//! serialized and at most one child exists at a time. The child handle itself
//! is owned by an exit-watcher task; the supervisor addresses it through a
//! cancellation token.
//!
//! Key design decisions:
//! - **Exit is not stop**: a child exiting on its own only updates the
//!   process-exit oracle. The health monitor decides when "Stopped" is shown.
//! - **Stop halts health first**: no probe can overwrite the final status.
//! - **Failed is not sticky**: a failed start can be retried.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use jarstarter_core::ports::LogSinkPort;
use jarstarter_core::{
    ExitState, PathError, ProcessState, Settings, StartOutcome, StatusTone, ensure_writable_dir,
};
use thiserror::Error;
use tokio::process::Child;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::capture::OutputCapture;
use super::command::LaunchSpec;
use super::shutdown::shutdown_child;
use crate::health::{HealthMonitor, ProcessExitOracle};
use crate::status::StatusStore;

/// Error from supervisor operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The OS refused to create the child. Retryable.
    #[error("Failed to launch child: {reason}")]
    Spawn { reason: String },

    /// The working directory cannot be created or written.
    #[error("Working directory unusable: {0}")]
    WorkDir(#[from] PathError),

    /// The child could not be terminated cleanly.
    #[error("Failed to terminate child: {0}")]
    Terminate(#[source] io::Error),

    /// Runtime or payload path does not exist.
    #[error("Launch input not found: {}", .0.display())]
    MissingPath(PathBuf),
}

/// Where and how often the health monitor probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthTarget {
    pub host: String,
    pub port: u16,
    pub interval: Duration,
}

impl HealthTarget {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            host: settings.health_host.clone(),
            port: settings.health_port,
            interval: settings.probe_interval(),
        }
    }
}

/// Handle to the live child.
struct SupervisedProcess {
    pid: u32,
    stop_token: CancellationToken,
    watcher: JoinHandle<io::Result<ExitStatus>>,
    exit_rx: watch::Receiver<ExitState>,
    _capture: OutputCapture,
}

#[derive(Default)]
struct Inner {
    state: ProcessState,
    process: Option<SupervisedProcess>,
    last_exit: ExitState,
}

/// Owns the payload child and its lifecycle.
pub struct ProcessSupervisor {
    inner: Mutex<Inner>,
    launch: LaunchSpec,
    health: HealthTarget,
    store: Arc<StatusStore>,
    sink: Arc<dyn LogSinkPort>,
    monitor: HealthMonitor,
}

impl ProcessSupervisor {
    /// Create a supervisor configured from `settings`.
    pub fn new(settings: &Settings, store: Arc<StatusStore>, sink: Arc<dyn LogSinkPort>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            launch: LaunchSpec::from_settings(settings),
            health: HealthTarget::from_settings(settings),
            monitor: HealthMonitor::new(Arc::clone(&store), settings.probe_timeout()),
            store,
            sink,
        }
    }

    /// Replace the launch parameters.
    #[must_use]
    pub fn with_launch(mut self, launch: LaunchSpec) -> Self {
        self.launch = launch;
        self
    }

    /// Replace the health probe target.
    #[must_use]
    pub fn with_health_target(mut self, health: HealthTarget) -> Self {
        self.health = health;
        self
    }

    /// Launch the payload unless a live child already exists.
    pub async fn start(
        &self,
        runtime: &Path,
        payload: &Path,
        work_dir: &Path,
    ) -> Result<StartOutcome, SupervisorError> {
        let mut inner = self.inner.lock().await;

        if let Some(ref process) = inner.process
            && !process.watcher.is_finished()
        {
            let pid = process.pid;
            info!(pid, "Start requested while child is running");
            self.store
                .set_with_tone("Already running", true, StatusTone::Warning);
            return Ok(StartOutcome::AlreadyRunning { pid });
        }

        if let Some(stale) = inner.process.take() {
            inner.last_exit = *stale.exit_rx.borrow();
            match stale.watcher.await {
                Ok(Ok(status)) => debug!(code = ?status.code(), "Reaped previous child"),
                Ok(Err(e)) => warn!(error = %e, "Previous child ended with error"),
                Err(e) => warn!(error = %e, "Previous exit-watcher panicked"),
            }
        }

        inner.state = ProcessState::Starting;

        for path in [runtime, payload] {
            if !path.exists() {
                let err = SupervisorError::MissingPath(path.to_path_buf());
                return Err(self.fail(&mut inner, err).await);
            }
        }
        if let Err(e) = ensure_writable_dir(work_dir) {
            return Err(self.fail(&mut inner, e.into()).await);
        }

        info!(
            runtime = %runtime.display(),
            payload = %payload.display(),
            work_dir = %work_dir.display(),
            "Launching payload"
        );

        let mut child = match self.launch.command(runtime, payload, work_dir).spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = SupervisorError::Spawn {
                    reason: e.to_string(),
                };
                return Err(self.fail(&mut inner, err).await);
            }
        };
        let Some(pid) = child.id() else {
            let err = SupervisorError::Spawn {
                reason: "child exited before its pid was read".to_string(),
            };
            return Err(self.fail(&mut inner, err).await);
        };

        let capture = OutputCapture::spawn(
            child.stdout.take(),
            child.stderr.take(),
            Arc::clone(&self.sink),
        );

        let (exit_tx, exit_oracle) = ProcessExitOracle::channel();
        exit_tx.send_replace(ExitState::Alive { pid });
        let exit_rx = exit_tx.subscribe();

        let stop_token = CancellationToken::new();
        let watcher = tokio::spawn(watch_child(
            child,
            pid,
            stop_token.clone(),
            exit_tx,
            self.launch.stop_grace,
        ));

        inner.state = ProcessState::Running { pid };
        inner.last_exit = ExitState::Alive { pid };
        inner.process = Some(SupervisedProcess {
            pid,
            stop_token,
            watcher,
            exit_rx,
            _capture: capture,
        });

        info!(pid, "Payload started");
        self.store.set("Running", true);

        self.monitor
            .start(
                &self.health.host,
                self.health.port,
                self.health.interval,
                Some(Arc::new(exit_oracle)),
            )
            .await;

        Ok(StartOutcome::Started { pid })
    }

    /// Stop health polling, then terminate and reap the child.
    ///
    /// Reports "Stopped" even when termination fails. Stopping with nothing
    /// running only reports "Stopped".
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock().await;
        self.monitor.stop().await;

        let Some(process) = inner.process.take() else {
            if !inner.state.accepts_start() {
                inner.state = ProcessState::Stopped;
            }
            debug!("Stop requested with no child");
            self.store.set("Stopped", false);
            return Ok(());
        };

        let pid = process.pid;
        inner.state = ProcessState::Stopping;
        info!(pid, grace_ms = self.launch.stop_grace.as_millis(), "Stopping payload");

        process.stop_token.cancel();
        let result = match process.watcher.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(e)),
        };
        inner.last_exit = *process.exit_rx.borrow();

        self.settle_stop(&mut inner, pid, result)
    }

    /// Final transition of a stop, whatever the termination outcome.
    fn settle_stop(
        &self,
        inner: &mut Inner,
        pid: u32,
        result: io::Result<ExitStatus>,
    ) -> Result<(), SupervisorError> {
        inner.state = ProcessState::Stopped;
        self.store.set("Stopped", false);

        match result {
            Ok(status) => {
                info!(pid, code = ?status.code(), "Payload stopped");
                Ok(())
            }
            Err(e) => {
                error!(pid, error = %e, "Failed to terminate payload");
                Err(SupervisorError::Terminate(e))
            }
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ProcessState {
        self.inner.lock().await.state.clone()
    }

    /// PID of the live child, if any.
    pub async fn pid(&self) -> Option<u32> {
        let inner = self.inner.lock().await;
        inner
            .process
            .as_ref()
            .filter(|p| !p.watcher.is_finished())
            .map(|p| p.pid)
    }

    /// What the exit-watcher last reported.
    pub async fn exit_state(&self) -> ExitState {
        let inner = self.inner.lock().await;
        inner
            .process
            .as_ref()
            .map_or(inner.last_exit, |p| *p.exit_rx.borrow())
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    pub const fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    /// Record a failed start. Polling for the previous run ends here too, so
    /// nothing overwrites the failure.
    async fn fail(&self, inner: &mut Inner, err: SupervisorError) -> SupervisorError {
        self.monitor.stop().await;
        let reason = err.to_string();
        error!(%reason, "Start failed");
        inner.state = ProcessState::Failed(reason.clone());
        let label = format!("Start failed: {reason}");
        self.sink.append(label.clone());
        self.store.set_with_tone(label, false, StatusTone::Error);
        err
    }
}

impl fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("launch", &self.launch)
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}

/// Own `child` until it exits or `stop` fires.
async fn watch_child(
    mut child: Child,
    pid: u32,
    stop: CancellationToken,
    exit_tx: watch::Sender<ExitState>,
    grace: Duration,
) -> io::Result<ExitStatus> {
    let result = tokio::select! {
        status = child.wait() => {
            match status {
                Ok(ref status) => info!(pid, code = ?status.code(), "Payload exited"),
                Err(ref e) => warn!(pid, error = %e, "Waiting for payload failed"),
            }
            status
        }
        () = stop.cancelled() => shutdown_child(&mut child, grace).await,
    };

    let code = result.as_ref().ok().and_then(ExitStatus::code);
    exit_tx.send_replace(ExitState::Exited { code });
    result
}
