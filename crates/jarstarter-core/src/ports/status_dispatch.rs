//! Presentation-boundary dispatch port.

use crate::domain::StatusSnapshot;

/// Hands status changes to whatever context renders them.
///
/// A GUI implementation posts the snapshot onto its UI thread; the CLI forwards
/// it into a channel drained by the main task. Called synchronously on every
/// status write, so implementations must only enqueue.
pub trait StatusDispatcher: Send + Sync {
    fn dispatch(&self, snapshot: StatusSnapshot);
}
