//! Consumer-side regulator pipeline
//!
//! Per inbound masked reading: decode, run the PID loop and thermal
//! reconstruction, re-anchor from trustworthy readings, and evaluate the
//! consumer-side alarms (overheat/undercool level checks plus two debounced
//! trackers for anomaly duration and night-window anomalies).

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use tv_error::Result;
use tv_protocol::{format_timestamp, Envelope};

use crate::alarm::{AlarmEvent, AlarmKind};
use crate::config::RegulatorConfig;
use crate::pid::Pid;
use crate::pipeline::DropCounters;
use crate::thermal::ThermalModel;
use crate::tracker::ProlongedTracker;

/// Per-message structured status for the observability sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegulatorStatus {
    pub timestamp: DateTime<Utc>,
    /// Temperature as delivered on the masked stream (°C)
    pub measured: f64,
    /// Controller output for this cycle
    pub control: f64,
    /// Reconstructed thermal estimate after this cycle (°C)
    pub estimate: f64,
    /// Producer-side anomaly flag, trusted as-is
    pub anomaly: bool,
}

/// Everything the daemon must act on for one regulated reading
#[derive(Debug)]
pub struct ConsumerOutcome {
    pub status: RegulatorStatus,
    pub alarms: Vec<AlarmEvent>,
}

/// One per-message transaction: decode -> control -> reconstruct -> alarms
pub struct ConsumerPipeline {
    envelope: Envelope,
    pid: Pid,
    thermal: ThermalModel,
    setpoint: f64,
    overheat: f64,
    undercool: f64,
    night_start: u32,
    night_end: u32,
    anomaly_duration: ProlongedTracker,
    night_window: ProlongedTracker,
    drops: DropCounters,
}

impl ConsumerPipeline {
    pub fn new(envelope: Envelope, config: &RegulatorConfig) -> Result<Self> {
        config.validate()?;
        let pid = Pid::new(
            config.pid.kp,
            config.pid.ki,
            config.pid.kd,
            config.thermal.dt_secs,
            config.pid.out_min,
            config.pid.out_max,
        )?
        .with_deadband(config.pid.deadband);
        let thermal = ThermalModel::new(
            config.thermal.r,
            config.thermal.c,
            config.thermal.dt_secs,
            config.thermal.ambient_c,
        )?;

        Ok(Self {
            envelope,
            pid,
            thermal,
            setpoint: config.setpoint_c,
            overheat: config.overheat_c,
            undercool: config.undercool_c,
            night_start: config.night_start_hour,
            night_end: config.night_end_hour,
            anomaly_duration: ProlongedTracker::from_secs(config.prolonged_secs),
            night_window: ProlongedTracker::from_secs(config.prolonged_secs),
            drops: DropCounters::default(),
        })
    }

    /// Process one delivered masked payload.
    pub fn handle(&mut self, payload: &[u8]) -> Result<ConsumerOutcome> {
        let reading = match self.envelope.decode_masked(payload) {
            Ok(reading) => reading,
            Err(err) => {
                self.drops.record(&err);
                return Err(err);
            }
        };

        let measured = reading.temperature;
        let control = self.pid.update(self.setpoint - measured);
        let mut estimate = self.thermal.step(measured, control);

        // Strict trust rule: a flagged-anomalous or out-of-band reading never
        // replaces the reconstructed estimate.
        let trusted =
            !reading.anomaly && measured > self.undercool && measured < self.overheat;
        if trusted {
            self.thermal.reanchor(measured);
            estimate = measured;
        }

        let mut alarms = Vec::new();

        // Threshold alarms are plain level checks, one event per offending
        // reading.
        if measured >= self.overheat {
            alarms.push(AlarmEvent::new(
                AlarmKind::Overheat,
                reading.timestamp,
                format!("measured {measured:.2}°C at or above {:.2}°C", self.overheat),
            ));
        }
        if measured <= self.undercool {
            alarms.push(AlarmEvent::new(
                AlarmKind::Undercool,
                reading.timestamp,
                format!("measured {measured:.2}°C at or below {:.2}°C", self.undercool),
            ));
        }

        let night_anomaly = reading.anomaly
            && in_night_window(reading.timestamp.hour(), self.night_start, self.night_end);
        if self.night_window.observe(night_anomaly, reading.timestamp) {
            let since = self
                .night_window
                .condition_start()
                .map(format_timestamp)
                .unwrap_or_default();
            alarms.push(AlarmEvent::new(
                AlarmKind::NightAnomaly,
                reading.timestamp,
                format!("night-window anomaly since {since}"),
            ));
        }

        if self.anomaly_duration.observe(reading.anomaly, reading.timestamp) {
            let since = self
                .anomaly_duration
                .condition_start()
                .map(format_timestamp)
                .unwrap_or_default();
            alarms.push(AlarmEvent::new(
                AlarmKind::ProlongedAnomaly,
                reading.timestamp,
                format!("anomalous readings since {since}"),
            ));
        }

        Ok(ConsumerOutcome {
            status: RegulatorStatus {
                timestamp: reading.timestamp,
                measured,
                control,
                estimate,
                anomaly: reading.anomaly,
            },
            alarms,
        })
    }

    /// Messages dropped so far at the decode boundary
    pub fn drops(&self) -> DropCounters {
        self.drops
    }
}

/// Whether an hour of day falls in the (possibly wrap-around) night window.
///
/// The window is `[start, end)`; when it wraps midnight the condition is
/// `hour >= start || hour < end`.
fn in_night_window(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}
