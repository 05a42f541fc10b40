//! Supervised process lifecycle types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the supervised child.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum ProcessState {
    #[default]
    NotStarted,
    Starting,
    Running {
        pid: u32,
    },
    Stopping,
    Stopped,
    /// Spawn failed; a later start may retry.
    Failed(String),
}

impl ProcessState {
    /// Whether a start request may launch a new child from this state.
    #[must_use]
    pub const fn accepts_start(&self) -> bool {
        matches!(self, Self::NotStarted | Self::Stopped | Self::Failed(_))
    }

    /// PID of the child when running.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        match self {
            Self::Running { pid } => Some(*pid),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Starting => write!(f, "starting"),
            Self::Running { pid } => write!(f, "running (pid {pid})"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// What the exit-watcher knows about the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitState {
    /// No child has been spawned yet.
    #[default]
    NotSpawned,
    /// The child is alive as far as the OS handle tells.
    Alive { pid: u32 },
    /// The child exited; `code` is `None` when killed by a signal.
    Exited { code: Option<i32> },
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new child was spawned.
    Started { pid: u32 },
    /// A live child already exists; nothing was spawned.
    AlreadyRunning { pid: u32 },
}

impl StartOutcome {
    /// PID of the child that is running after the request.
    #[must_use]
    pub const fn pid(self) -> u32 {
        match self {
            Self::Started { pid } | Self::AlreadyRunning { pid } => pid,
        }
    }
}
