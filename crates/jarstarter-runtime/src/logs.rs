//! Log sinks for captured payload output.
//!
//! - `TracingLogSink` - forwards lines into `tracing` (the CLI routes the
//!   `payload` target into the append-only log file)
//! - `LogBuffer` - bounded in-memory ring buffer with live subscription

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use jarstarter_core::ports::LogSinkPort;
use tokio::sync::broadcast;
use tracing::info;

/// Tracing target used for payload output lines.
pub const PAYLOAD_TARGET: &str = "payload";

/// Default number of lines kept by a [`LogBuffer`].
pub const DEFAULT_BUFFER_LINES: usize = 5000;

/// Sink that emits every line as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSinkPort for TracingLogSink {
    fn append(&self, line: String) {
        info!(target: PAYLOAD_TARGET, "{line}");
    }
}

/// A single buffered log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

/// Bounded ring buffer of recent lines with a broadcast channel for tailing.
pub struct LogBuffer {
    lines: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
    broadcast_tx: broadcast::Sender<LogEntry>,
}

impl LogBuffer {
    /// Create a buffer keeping at most `capacity` lines.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(1000);
        Self {
            lines: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_BUFFER_LINES))),
            capacity: capacity.max(1),
            broadcast_tx,
        }
    }

    /// Snapshot of all buffered lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        let lines = self.lines.read().unwrap_or_else(PoisonError::into_inner);
        lines.iter().map(|e| e.line.clone()).collect()
    }

    /// Snapshot of all buffered entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        let lines = self.lines.read().unwrap_or_else(PoisonError::into_inner);
        lines.iter().cloned().collect()
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive lines appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.broadcast_tx.subscribe()
    }

    /// Drop all buffered lines.
    pub fn clear(&self) {
        self.lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_LINES)
    }
}

impl LogSinkPort for LogBuffer {
    fn append(&self, line: String) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            line,
        };

        {
            let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(entry.clone());
        }

        // No subscribers is fine
        let _ = self.broadcast_tx.send(entry);
    }
}
