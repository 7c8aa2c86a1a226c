//! Prolonged-state tracker
//!
//! A generic debounced state machine used on both sides of the pipeline to
//! detect "condition held continuously for at least N seconds". One sample
//! with the condition false resets the whole episode - the debounce is
//! edge-triggered, so re-arming requires the full threshold duration again.

use chrono::{DateTime, Duration, Utc};

/// Alarm state for one tracked condition.
///
/// Invariant: `fired` implies `active` and a recorded `condition_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmState {
    pub active: bool,
    pub condition_start: Option<DateTime<Utc>>,
    pub fired: bool,
}

/// Debounced Idle -> Armed -> Fired state machine.
///
/// Runs on message timestamps, not wall clock, so replayed or reordered
/// deliveries cannot fire an alarm early: a timestamp before the episode
/// start yields a negative elapsed time, which never reaches the threshold.
#[derive(Debug, Clone)]
pub struct ProlongedTracker {
    threshold: Duration,
    state: AlarmState,
}

impl ProlongedTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            state: AlarmState::default(),
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::seconds(secs as i64))
    }

    /// Feed one observation of the tracked condition.
    ///
    /// Returns `true` exactly once per episode: on the first sample where
    /// the condition has held continuously for at least the threshold
    /// (inclusive comparison). A false condition resets to idle from any
    /// state.
    pub fn observe(&mut self, condition: bool, now: DateTime<Utc>) -> bool {
        if !condition {
            self.state = AlarmState::default();
            return false;
        }

        let start = *self.state.condition_start.get_or_insert(now);
        self.state.active = true;

        if !self.state.fired && now - start >= self.threshold {
            self.state.fired = true;
            return true;
        }
        false
    }

    /// Current alarm state (for diagnostics and alarm event detail)
    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    /// Start of the current episode, if one is running
    pub fn condition_start(&self) -> Option<DateTime<Utc>> {
        self.state.condition_start
    }
}
