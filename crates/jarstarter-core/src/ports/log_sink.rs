//! Log sink port for captured child output and lifecycle messages.
//!
//! This port abstracts the destination of lines the launcher wants persisted
//! (the append-only log file in production, an in-memory buffer in tests).

/// Port for appending log lines to a sink.
///
/// Implementations must be thread-safe and must not block for long: the
/// output capture task calls this once per child output line.
pub trait LogSinkPort: Send + Sync {
    /// Append a single line (without trailing newline).
    fn append(&self, line: String);
}
