//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core expects from infrastructure and from
//! the presentation layer. They contain no implementation details.

mod liveness;
mod log_sink;
mod resource_bundle;
mod status_dispatch;

pub use liveness::LivenessOracle;
pub use log_sink::LogSinkPort;
pub use resource_bundle::ResourceBundle;
pub use status_dispatch::StatusDispatcher;
