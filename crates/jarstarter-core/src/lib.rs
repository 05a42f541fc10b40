//! Core domain types, ports and path resolution for jarstarter.
//!
//! This crate has no process or network code. The runtime crate implements
//! the ports; adapters (the CLI, a GUI) consume the domain types.

pub mod domain;
pub mod paths;
pub mod ports;
pub mod settings;

pub use domain::{
    ExitState, HealthObservation, Liveness, PayloadSource, PortState, ProcessState,
    ProvisionedPayload, ProvisionedRuntime, StartOutcome, StatusSnapshot, StatusTone, Verdict,
};
pub use paths::{LauncherPaths, PathError, ensure_writable_dir};
pub use ports::{LivenessOracle, LogSinkPort, ResourceBundle, StatusDispatcher};
pub use settings::{Settings, SettingsError, SettingsOverrides, validate_settings};
