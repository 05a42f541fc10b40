//! Health observation and liveness verdict types.
//!
//! Two independent signals say whether the payload is alive: the TCP probe and
//! the OS process handle. Neither is trusted alone, since the launched process
//! may be a thin wrapper that forks the real service. [`Verdict::combine`]
//! is the single place where they are reconciled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tri-state result of the most recent port probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    #[default]
    Unknown,
    Open,
    Closed,
}

/// Last observation made by the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthObservation {
    pub last_known_open: PortState,
    pub observed_at: Option<DateTime<Utc>>,
}

impl HealthObservation {
    /// Record a fresh probe result.
    #[must_use]
    pub fn observed(open: bool) -> Self {
        Self {
            last_known_open: if open { PortState::Open } else { PortState::Closed },
            observed_at: Some(Utc::now()),
        }
    }
}

/// Answer of a single liveness oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    /// The oracle has nothing to say (no process spawned yet).
    Unknown,
    Alive,
    Dead,
}

/// Reconciled liveness of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The service port accepts connections.
    Up,
    /// Port closed but the process is still alive (booting or hung).
    Pending,
    /// Port closed and no live process: the payload is gone.
    Down,
}

impl Verdict {
    /// Combine the port probe with the process exit oracle.
    ///
    /// A reachable port wins over everything; "down" requires both oracles to
    /// agree that nothing is left.
    #[must_use]
    pub const fn combine(port: Liveness, process: Liveness) -> Self {
        match (port, process) {
            (Liveness::Alive, _) => Self::Up,
            (_, Liveness::Alive) => Self::Pending,
            _ => Self::Down,
        }
    }

    /// Whether the payload should be reported as running.
    #[must_use]
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::Down)
    }
}
