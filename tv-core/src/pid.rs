//! Discrete-time PID controller
//!
//! Fixed-interval PID with an optional error deadband, conditional
//! integration for anti-windup, and output clamping. One instance owns its
//! state and is updated exactly once per control cycle.

use tracing::warn;

use tv_error::{Result, ThermoveilError};

/// Persistent controller state, mutated once per cycle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidState {
    pub integral: f64,
    pub prev_error: f64,
}

/// PID controller with anti-windup and output clamping
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    dt: f64,
    out_min: f64,
    out_max: f64,
    deadband: f64,
    state: PidState,
    last_output: f64,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64, dt: f64, out_min: f64, out_max: f64) -> Result<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ThermoveilError::invalid_config("dt", "must be positive"));
        }
        if out_min >= out_max {
            return Err(ThermoveilError::invalid_config(
                "out_min",
                "must be less than out_max",
            ));
        }
        Ok(Self {
            kp,
            ki,
            kd,
            dt,
            out_min,
            out_max,
            deadband: 0.0,
            state: PidState::default(),
            last_output: 0.0,
        })
    }

    /// Set the error deadband.
    ///
    /// Errors smaller in magnitude than the deadband are treated as exactly
    /// zero for that cycle, suppressing oscillation from measurement noise.
    pub fn with_deadband(mut self, deadband: f64) -> Self {
        self.deadband = deadband.max(0.0);
        self
    }

    /// Run one control cycle and return the clamped output.
    ///
    /// Anti-windup is conditional integration: the integral update for this
    /// cycle is only committed when the output did not saturate. A
    /// non-finite error or output holds the last valid output and leaves the
    /// persisted state untouched, so NaN never poisons the controller.
    pub fn update(&mut self, error: f64) -> f64 {
        if !error.is_finite() {
            warn!(error, "non-finite controller error, holding last output");
            return self.last_output;
        }

        let error = if error.abs() < self.deadband { 0.0 } else { error };

        let tentative_integral = self.state.integral + error * self.dt;
        let derivative = (error - self.state.prev_error) / self.dt;
        let unclamped = self.kp * error + self.ki * tentative_integral + self.kd * derivative;

        if !unclamped.is_finite() {
            warn!(unclamped, "non-finite controller output, holding last output");
            return self.last_output;
        }

        let output = unclamped.clamp(self.out_min, self.out_max);
        if output == unclamped {
            self.state.integral = tentative_integral;
        }
        self.state.prev_error = error;
        self.last_output = output;
        output
    }

    /// Current controller state (for diagnostics)
    pub fn state(&self) -> &PidState {
        &self.state
    }

    /// Reset the controller to its initial state
    pub fn reset(&mut self) {
        self.state = PidState::default();
        self.last_output = 0.0;
    }
}
