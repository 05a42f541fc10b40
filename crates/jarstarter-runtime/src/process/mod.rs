//! Child process launch, output capture and supervision.

mod capture;
mod command;
mod shutdown;
mod supervisor;

pub use capture::{OutputCapture, StreamKind, strip_ansi};
pub use command::{COLOR_ENV_OVERLAY, LaunchSpec};
pub use shutdown::shutdown_child;
pub use supervisor::{HealthTarget, ProcessSupervisor, SupervisorError};
