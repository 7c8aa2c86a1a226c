//! Structured alarm events
//!
//! Pipelines return alarm events alongside their per-message results; the
//! hosting daemon forwards them to the observability sink. The sink
//! transport (log stream, metrics daemon) is external.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What condition an alarm reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    /// Anomalous readings held continuously past the configured duration
    ProlongedAnomaly,
    /// Reading at or above the overheat threshold
    Overheat,
    /// Reading at or below the undercool threshold
    Undercool,
    /// Anomalous reading sustained inside the night window
    NightAnomaly,
    /// A capability failed and the pipeline is running degraded
    Degraded,
}

impl AlarmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmKind::ProlongedAnomaly => "prolonged_anomaly",
            AlarmKind::Overheat => "overheat",
            AlarmKind::Undercool => "undercool",
            AlarmKind::NightAnomaly => "night_anomaly",
            AlarmKind::Degraded => "degraded",
        }
    }
}

/// One structured alarm event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmEvent {
    pub kind: AlarmKind,
    pub timestamp: DateTime<Utc>,
    pub detail: String,
}

impl AlarmEvent {
    pub fn new(kind: AlarmKind, timestamp: DateTime<Utc>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&AlarmKind::ProlongedAnomaly).unwrap();
        assert_eq!(json, "\"prolonged_anomaly\"");
        assert_eq!(AlarmKind::NightAnomaly.as_str(), "night_anomaly");
    }

    #[test]
    fn test_event_carries_fields() {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap();
        let event = AlarmEvent::new(AlarmKind::Overheat, t, "measured 31.20");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "overheat");
        assert_eq!(json["detail"], "measured 31.20");
    }
}
