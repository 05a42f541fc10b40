//! Periodic health reconciliation.
//!
//! [`verdict_changes`] polls the liveness oracles on a fixed interval and
//! yields only when the reconciled [`Verdict`] changes. [`HealthMonitor`]
//! drives that stream in a background task and writes each change to the
//! [`StatusStore`].

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use jarstarter_core::{HealthObservation, Liveness, LivenessOracle, StatusTone, Verdict};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::probe::PortProbeOracle;
use crate::status::StatusStore;

/// Label, running flag and tone written for a verdict.
pub fn verdict_status(verdict: Verdict, port: u16) -> (String, bool, StatusTone) {
    match verdict {
        Verdict::Up => ("Running".to_string(), true, StatusTone::Ok),
        Verdict::Pending => (format!("Waiting for port {port}"), true, StatusTone::Warning),
        Verdict::Down => ("Stopped".to_string(), false, StatusTone::Error),
    }
}

/// Poll the oracles every `every` and yield each verdict change.
///
/// The first tick always yields. Every probe result is recorded in
/// `observation`. The stream ends when `cancel` fires.
pub fn verdict_changes(
    port_oracle: Arc<dyn LivenessOracle>,
    process_oracle: Option<Arc<dyn LivenessOracle>>,
    every: Duration,
    observation: Arc<watch::Sender<HealthObservation>>,
    cancel: CancellationToken,
) -> impl Stream<Item = Verdict> {
    stream! {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last: Option<Verdict> = None;

        debug!(
            port_oracle = port_oracle.name(),
            process_oracle = process_oracle.as_ref().map(|o| o.name()),
            "Health monitor polling"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Health monitor cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let port = port_oracle.observe().await;
                    observation.send_replace(HealthObservation::observed(port == Liveness::Alive));

                    let process = match process_oracle {
                        Some(ref oracle) => oracle.observe().await,
                        None => Liveness::Unknown,
                    };
                    let verdict = Verdict::combine(port, process);

                    if last != Some(verdict) {
                        debug!(?port, ?process, ?verdict, previous = ?last, "Health verdict changed");
                        last = Some(verdict);
                        yield verdict;
                    }
                }
            }
        }
    }
}

struct MonitorHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Background task reconciling liveness into the status store.
pub struct HealthMonitor {
    store: Arc<StatusStore>,
    probe_timeout: Duration,
    observation: Arc<watch::Sender<HealthObservation>>,
    handle: Mutex<Option<MonitorHandle>>,
}

impl HealthMonitor {
    pub fn new(store: Arc<StatusStore>, probe_timeout: Duration) -> Self {
        let (tx, _) = watch::channel(HealthObservation::default());
        Self {
            store,
            probe_timeout,
            observation: Arc::new(tx),
            handle: Mutex::new(None),
        }
    }

    /// Start probing `host:port` every `every`.
    ///
    /// A running monitor is stopped first. The observation restarts from
    /// unknown, so the first probe always writes a status.
    pub async fn start(
        &self,
        host: &str,
        port: u16,
        every: Duration,
        process_oracle: Option<Arc<dyn LivenessOracle>>,
    ) {
        let port_oracle = Arc::new(PortProbeOracle::new(host, port, self.probe_timeout));
        self.start_with_oracles(port_oracle, process_oracle, port, every)
            .await;
    }

    /// Start with an explicit port oracle. `port` is only used in labels.
    pub async fn start_with_oracles(
        &self,
        port_oracle: Arc<dyn LivenessOracle>,
        process_oracle: Option<Arc<dyn LivenessOracle>>,
        port: u16,
        every: Duration,
    ) {
        let mut guard = self.handle.lock().await;
        if let Some(previous) = guard.take() {
            shutdown(previous).await;
        }

        self.observation.send_replace(HealthObservation::default());

        let cancel = CancellationToken::new();
        let mut changes = Box::pin(verdict_changes(
            port_oracle,
            process_oracle,
            every,
            Arc::clone(&self.observation),
            cancel.clone(),
        ));
        let store = Arc::clone(&self.store);
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            while let Some(verdict) = changes.next().await {
                // A probe that straddled stop() must not write
                if token.is_cancelled() {
                    break;
                }
                let (label, is_running, tone) = verdict_status(verdict, port);
                store.set_with_tone(label, is_running, tone);
            }
        });

        info!(port, interval_ms = every.as_millis(), "Health monitor started");
        *guard = Some(MonitorHandle { cancel, join });
    }

    /// Stop probing. No status write happens after this returns.
    pub async fn stop(&self) {
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            shutdown(handle).await;
            info!("Health monitor stopped");
        }
    }

    /// Whether the background task is active.
    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.join.is_finished())
    }

    /// Latest probe result.
    pub fn observation(&self) -> HealthObservation {
        *self.observation.borrow()
    }
}

async fn shutdown(handle: MonitorHandle) {
    handle.cancel.cancel();
    if let Err(e) = handle.join.await {
        warn!(error = %e, "Health monitor task ended abnormally");
    }
}
