//! Bounded shutdown of the supervised child: terminate, wait, kill.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, warn};

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Ask the child to exit, escalating to a kill after `grace`.
///
/// Always reaps the child before returning so no zombie is left behind.
/// On Windows there is no terminate request, so the child is killed at once.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        debug!(?status, "Child already exited");
        return Ok(status);
    }

    #[cfg(unix)]
    {
        if request_terminate(child)? {
            if let Ok(result) = timeout(grace, child.wait()).await {
                return result;
            }
            warn!(grace_ms = grace.as_millis(), "Child ignored terminate request, killing");
        } else {
            return child.wait().await;
        }
    }

    #[cfg(not(unix))]
    let _ = grace;

    child.kill().await?;
    child.wait().await
}

/// Send SIGTERM. Returns `false` if the process is already gone.
#[cfg(unix)]
fn request_terminate(child: &Child) -> io::Result<bool> {
    let Some(pid) = child.id() else {
        return Ok(false);
    };
    let pid = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    match signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => Ok(true),
        Err(nix::errno::Errno::ESRCH) => Ok(false),
        Err(e) => Err(io::Error::other(e)),
    }
}
