//! Liveness oracle port.

use async_trait::async_trait;

use crate::domain::Liveness;

/// A source of truth about whether the payload is alive.
///
/// The health monitor polls one oracle per signal (port probe, process exit)
/// and reconciles their answers; oracles never write status themselves.
#[async_trait]
pub trait LivenessOracle: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    /// Take one observation. Must return within a bounded time.
    async fn observe(&self) -> Liveness;
}
