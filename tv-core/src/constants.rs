//! Constants and configuration defaults for Thermoveil
//!
//! Centralizes the documented defaults for thresholds, masking, alarms,
//! control, and the thermal model. Never use magic numbers in other files -
//! add them here first.

/// Temperature thresholds (°C)
pub mod thresholds {
    /// Overheat threshold: at or above this, masking is bypassed entirely
    pub const OVERHEAT_C: f64 = 30.0;

    /// Undercool threshold: at or below this, masking is bypassed entirely
    pub const UNDERCOOL_C: f64 = 21.0;

    /// Quiescent baseline center used to re-center anomalous readings
    pub const BASELINE_CENTER_C: f64 = 25.0;
}

/// Masking noise parameters
pub mod masking {
    /// Noise sigma applied when re-centering an anomalous reading
    pub const ANOMALY_SIGMA: f64 = 0.1;

    /// Light noise sigma applied to normal readings
    pub const NORMAL_SIGMA: f64 = 0.02;
}

/// Alarm configuration
pub mod alarms {
    /// Seconds an anomaly must hold continuously before the prolonged alarm
    /// fires (deployment profiles use 20-60)
    pub const PROLONGED_SECS: u64 = 20;

    /// Start of the night window (hour of day, inclusive)
    pub const NIGHT_START_HOUR: u32 = 22;

    /// End of the night window (hour of day, exclusive)
    pub const NIGHT_END_HOUR: u32 = 5;
}

/// PID controller defaults
pub mod control {
    /// Desired temperature (°C)
    pub const SETPOINT_C: f64 = 25.0;

    /// Proportional gain
    pub const KP: f64 = 2.0;

    /// Integral gain
    pub const KI: f64 = 0.1;

    /// Derivative gain
    pub const KD: f64 = 0.05;

    /// Lower output clamp
    pub const OUT_MIN: f64 = -50.0;

    /// Upper output clamp
    pub const OUT_MAX: f64 = 50.0;

    /// Error deadband; 0.0 disables it
    pub const DEADBAND: f64 = 0.0;
}

/// Thermal reconstruction model defaults
pub mod thermal {
    /// Thermal resistance
    pub const R: f64 = 10.0;

    /// Thermal capacitance
    pub const C: f64 = 5.0;

    /// Control loop interval (seconds)
    pub const DT_SECS: f64 = 1.0;

    /// Ambient temperature outside the controlled space (°C)
    pub const AMBIENT_C: f64 = 22.0;
}
