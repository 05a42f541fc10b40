//! Process-exit liveness oracle.

use async_trait::async_trait;
use jarstarter_core::{ExitState, Liveness, LivenessOracle};
use tokio::sync::watch;

/// Oracle fed by the supervisor's exit-watcher.
#[derive(Debug, Clone)]
pub struct ProcessExitOracle {
    rx: watch::Receiver<ExitState>,
}

impl ProcessExitOracle {
    /// Create an oracle and the sender the exit-watcher publishes to.
    pub fn channel() -> (watch::Sender<ExitState>, Self) {
        let (tx, rx) = watch::channel(ExitState::NotSpawned);
        (tx, Self { rx })
    }

    /// Latest published exit state.
    pub fn state(&self) -> ExitState {
        *self.rx.borrow()
    }
}

#[async_trait]
impl LivenessOracle for ProcessExitOracle {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn observe(&self) -> Liveness {
        match self.state() {
            ExitState::NotSpawned => Liveness::Unknown,
            ExitState::Alive { .. } => Liveness::Alive,
            ExitState::Exited { .. } => Liveness::Dead,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn follows_published_exit_state() {
        let (tx, oracle) = ProcessExitOracle::channel();
        assert_eq!(oracle.observe().await, Liveness::Unknown);

        tx.send_replace(ExitState::Alive { pid: 42 });
        assert_eq!(oracle.observe().await, Liveness::Alive);

        tx.send_replace(ExitState::Exited { code: Some(0) });
        assert_eq!(oracle.observe().await, Liveness::Dead);
    }
}
