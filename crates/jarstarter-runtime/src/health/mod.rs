//! Liveness oracles and the periodic health monitor.

mod monitor;
mod oracle;
mod probe;

pub use monitor::{HealthMonitor, verdict_changes, verdict_status};
pub use oracle::ProcessExitOracle;
pub use probe::{PortProbeOracle, ProbeError, probe_port};
