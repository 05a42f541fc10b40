//! Reported lifecycle status as seen by the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visual style class attached to a status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    /// Payload is up.
    Ok,
    /// Attention needed but nothing failed (already running, waiting for port).
    Warning,
    /// Stopped or failed.
    Error,
}

impl StatusTone {
    /// Style class name a UI can attach to the label.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Ok => "status-ok",
            Self::Warning => "status-warning",
            Self::Error => "status-error",
        }
    }

    /// Indicator glyph shown in front of the label.
    #[must_use]
    pub const fn indicator(self) -> &'static str {
        match self {
            Self::Ok => "🟢",
            Self::Warning => "🟡",
            Self::Error => "🔴",
        }
    }

    /// Default tone for a running flag.
    #[must_use]
    pub const fn for_running(is_running: bool) -> Self {
        if is_running { Self::Ok } else { Self::Error }
    }
}

/// A consistent view of the reported status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Human-readable label.
    pub label: String,
    /// Whether the payload is considered running (drives start/stop enablement).
    pub is_running: bool,
    /// Style class.
    pub tone: StatusTone,
    /// When this snapshot was written.
    pub updated_at: DateTime<Utc>,
    /// Number of writes the store has accepted, including this one.
    pub revision: u64,
}

impl StatusSnapshot {
    /// Status before anything was started.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            label: "Stopped".to_string(),
            is_running: false,
            tone: StatusTone::Error,
            updated_at: Utc::now(),
            revision: 0,
        }
    }

    /// Label decorated with the tone indicator, as the UI shows it.
    #[must_use]
    pub fn display_label(&self) -> String {
        format!("{} {}", self.tone.indicator(), self.label)
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_follows_running_flag() {
        assert_eq!(StatusTone::for_running(true), StatusTone::Ok);
        assert_eq!(StatusTone::for_running(false), StatusTone::Error);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = StatusSnapshot::initial();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"isRunning\":false"));
        assert!(json.contains("\"tone\":\"error\""));
        assert_eq!(snapshot.display_label(), "🔴 Stopped");
    }
}
