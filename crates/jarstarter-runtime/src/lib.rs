//! Runtime for jarstarter: provisioning, supervision and health monitoring.
//!
//! This crate implements the ports defined in `jarstarter-core` and owns all
//! process, filesystem and network side effects.

#![deny(unsafe_code)]

pub mod health;
mod launcher;
pub mod logs;
pub mod process;
pub mod provision;
pub mod status;
pub mod system;

pub use launcher::{LaunchError, Launcher};

pub use health::{HealthMonitor, PortProbeOracle, ProbeError, ProcessExitOracle};
pub use logs::{LogBuffer, LogEntry, PAYLOAD_TARGET, TracingLogSink};
pub use process::{
    HealthTarget, LaunchSpec, OutputCapture, ProcessSupervisor, SupervisorError, strip_ansi,
};
pub use provision::{
    DirBundle, ManifestEntry, ProvisioningError, ResourceProvisioner, StaticBundle,
};
pub use status::{ChannelDispatcher, StatusStore};
