//! Core domain types.
//!
//! Pure data with no infrastructure dependencies.

mod health;
mod process;
mod provision;
mod status;

pub use health::{HealthObservation, Liveness, PortState, Verdict};
pub use process::{ExitState, ProcessState, StartOutcome};
pub use provision::{PayloadSource, ProvisionedPayload, ProvisionedRuntime};
pub use status::{StatusSnapshot, StatusTone};
