//! The single reconciliation point for the reported status.
//!
//! Both the supervisor and the health monitor write here; readers always get a
//! whole snapshot. Writes are last-writer-wins and each one bumps `revision`.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use jarstarter_core::ports::StatusDispatcher;
use jarstarter_core::{StatusSnapshot, StatusTone};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Concurrency-safe status cell.
pub struct StatusStore {
    tx: watch::Sender<StatusSnapshot>,
    dispatcher: Option<Arc<dyn StatusDispatcher>>,
}

impl StatusStore {
    /// Create a store holding the initial "Stopped" status.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(StatusSnapshot::initial());
        Self {
            tx,
            dispatcher: None,
        }
    }

    /// Create a store that forwards every write to `dispatcher`.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Arc<dyn StatusDispatcher>) -> Self {
        Self {
            dispatcher: Some(dispatcher),
            ..Self::new()
        }
    }

    /// Write a status with the default tone for `is_running`.
    pub fn set(&self, label: impl Into<String>, is_running: bool) -> StatusSnapshot {
        self.set_with_tone(label, is_running, StatusTone::for_running(is_running))
    }

    /// Write a status with an explicit tone.
    pub fn set_with_tone(
        &self,
        label: impl Into<String>,
        is_running: bool,
        tone: StatusTone,
    ) -> StatusSnapshot {
        let label = label.into();
        let mut written = None;
        self.tx.send_modify(|current| {
            current.label = label;
            current.is_running = is_running;
            current.tone = tone;
            current.updated_at = Utc::now();
            current.revision += 1;
            written = Some(current.clone());
        });

        // send_modify always runs the closure
        let snapshot = written.unwrap_or_else(|| self.get());
        self.publish(&snapshot);
        snapshot
    }

    /// Atomic read-modify-write.
    ///
    /// `f` sees the current snapshot and returns the replacement
    /// `(label, is_running, tone)`, or `None` to leave the store untouched.
    /// No other writer can interleave between the read and the write.
    pub fn modify<F>(&self, f: F) -> Option<StatusSnapshot>
    where
        F: FnOnce(&StatusSnapshot) -> Option<(String, bool, StatusTone)>,
    {
        let mut written = None;
        self.tx.send_if_modified(|current| {
            let Some((label, is_running, tone)) = f(current) else {
                return false;
            };
            current.label = label;
            current.is_running = is_running;
            current.tone = tone;
            current.updated_at = Utc::now();
            current.revision += 1;
            written = Some(current.clone());
            true
        });

        if let Some(ref snapshot) = written {
            self.publish(snapshot);
        }
        written
    }

    /// Current snapshot.
    pub fn get(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    /// Number of writes accepted so far.
    pub fn revision(&self) -> u64 {
        self.tx.borrow().revision
    }

    /// Receiver notified on every write.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }

    fn publish(&self, snapshot: &StatusSnapshot) {
        debug!(
            label = %snapshot.label,
            is_running = snapshot.is_running,
            revision = snapshot.revision,
            "Status updated"
        );
        if let Some(ref dispatcher) = self.dispatcher {
            dispatcher.dispatch(snapshot.clone());
        }
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusStore")
            .field("current", &*self.tx.borrow())
            .finish_non_exhaustive()
    }
}

/// Dispatcher forwarding snapshots into an unbounded channel.
///
/// The receiving end is drained by whichever task owns the presentation.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<StatusSnapshot>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiver it feeds.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusDispatcher for ChannelDispatcher {
    fn dispatch(&self, snapshot: StatusSnapshot) {
        // Receiver gone means the presentation shut down first
        let _ = self.tx.send(snapshot);
    }
}
