//! Thermal reconstruction model
//!
//! First-order RC model of the controlled space, driven by the controller
//! output and periodically re-anchored to trusted measurements. The model
//! exists because the consumer sees a masked stream: between trustworthy
//! readings the estimate evolves from physics, not from the (possibly
//! perturbed) wire values.

use tracing::warn;

use tv_error::{Result, ThermoveilError};

/// First-order RC thermal model.
///
/// `estimate' = estimate + (-(estimate - ambient)/(R*C) + control/C) * dt`
#[derive(Debug, Clone)]
pub struct ThermalModel {
    r: f64,
    c: f64,
    dt: f64,
    ambient: f64,
    estimate: Option<f64>,
}

impl ThermalModel {
    pub fn new(r: f64, c: f64, dt: f64, ambient: f64) -> Result<Self> {
        for (field, value) in [("r", r), ("c", c), ("dt", dt)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ThermoveilError::invalid_config(field, "must be positive"));
            }
        }
        if !ambient.is_finite() {
            return Err(ThermoveilError::invalid_config("ambient", "must be finite"));
        }
        Ok(Self {
            r,
            c,
            dt,
            ambient,
            estimate: None,
        })
    }

    /// Advance the model by one cycle.
    ///
    /// The first call initializes the estimate from the measurement before
    /// stepping. Returns the updated estimate. A non-finite step is skipped
    /// so the persisted estimate stays valid.
    pub fn step(&mut self, measured: f64, control: f64) -> f64 {
        let estimate = self.estimate.get_or_insert(measured);
        let delta = (-(*estimate - self.ambient) / (self.r * self.c) + control / self.c) * self.dt;
        if delta.is_finite() {
            *estimate += delta;
        } else {
            warn!(delta, "non-finite thermal step, keeping previous estimate");
        }
        *estimate
    }

    /// Discard the drifting estimate in favor of a trusted measurement.
    ///
    /// The caller decides trust; re-anchoring on a flagged-anomalous or
    /// out-of-band reading defeats reconstruction through masked data.
    pub fn reanchor(&mut self, measured: f64) {
        self.estimate = Some(measured);
    }

    /// Current estimate; `None` until the first measurement arrives
    pub fn estimate(&self) -> Option<f64> {
        self.estimate
    }
}
