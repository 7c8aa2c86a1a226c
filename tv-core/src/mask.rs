//! Masking policy engine
//!
//! Maps a classified reading to the value that is safe to disclose. The
//! policy encodes the privacy/utility tradeoff: anomalous readings are
//! re-centered on the quiescent baseline (destroying the true dip magnitude
//! while staying numerically plausible), normal readings get light noise for
//! statistical indistinguishability, and safety-relevant extremes are never
//! hidden.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use tv_error::{Result, ThermoveilError};

use crate::classify::Classification;
use crate::constants::masking;

/// Policy mapping `(value, classification)` to the outgoing value.
///
/// Evaluated in strict precedence order:
/// 1. `value >= overheat`: pass through unchanged - overheat is never hidden.
/// 2. `value <= undercool`: pass through unchanged (symmetric safety rule).
/// 3. Anomalous: `baseline_center + N(0, anomaly_sigma)`.
/// 4. Otherwise: `value + N(0, normal_sigma)`.
pub struct MaskPolicy {
    overheat: f64,
    undercool: f64,
    baseline_center: f64,
    anomaly_noise: Normal<f64>,
    normal_noise: Normal<f64>,
    rng: StdRng,
}

impl MaskPolicy {
    /// Create a policy with the default noise sigmas, seeded from OS entropy.
    pub fn new(overheat: f64, undercool: f64, baseline_center: f64) -> Result<Self> {
        if undercool >= overheat {
            return Err(ThermoveilError::invalid_config(
                "undercool_c",
                "must be strictly below overheat_c",
            ));
        }
        let anomaly_noise = Normal::new(0.0, masking::ANOMALY_SIGMA)
            .map_err(|e| ThermoveilError::invalid_config("anomaly_sigma", e.to_string()))?;
        let normal_noise = Normal::new(0.0, masking::NORMAL_SIGMA)
            .map_err(|e| ThermoveilError::invalid_config("normal_sigma", e.to_string()))?;

        Ok(Self {
            overheat,
            undercool,
            baseline_center,
            anomaly_noise,
            normal_noise,
            rng: StdRng::from_entropy(),
        })
    }

    /// Replace the entropy-seeded RNG with a deterministic one.
    ///
    /// Test hook only: production construction stays on `new`, which seeds
    /// from OS entropy so noise draws are never repeatable across restarts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Compute the outgoing value for one reading.
    pub fn mask(&mut self, value: f64, classification: Classification) -> f64 {
        if value >= self.overheat {
            return value;
        }
        if value <= self.undercool {
            return value;
        }
        match classification {
            Classification::Anomalous => self.baseline_center + self.rng.sample(self.anomaly_noise),
            Classification::Normal => value + self.rng.sample(self.normal_noise),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::thresholds;

    fn test_policy() -> MaskPolicy {
        MaskPolicy::new(
            thresholds::OVERHEAT_C,
            thresholds::UNDERCOOL_C,
            thresholds::BASELINE_CENTER_C,
        )
        .unwrap()
        .with_seed(42)
    }

    #[test]
    fn test_overheat_passes_through_exactly() {
        let mut policy = test_policy();
        for value in [30.0, 30.5, 55.0, 100.0] {
            assert_eq!(policy.mask(value, Classification::Normal), value);
            assert_eq!(policy.mask(value, Classification::Anomalous), value);
        }
    }

    #[test]
    fn test_undercool_passes_through_exactly() {
        let mut policy = test_policy();
        for value in [21.0, 18.0, -5.0] {
            assert_eq!(policy.mask(value, Classification::Normal), value);
            assert_eq!(policy.mask(value, Classification::Anomalous), value);
        }
    }

    #[test]
    fn test_anomalous_recentered_on_baseline() {
        let mut policy = test_policy();
        for _ in 0..1000 {
            let masked = policy.mask(23.0, Classification::Anomalous);
            // 5-sigma bound on N(25.0, 0.1); the true dip never leaks
            assert!((24.5..=25.5).contains(&masked), "out of band: {masked}");
            assert_ne!(masked, 23.0);
        }
    }

    #[test]
    fn test_normal_gets_light_noise() {
        let mut policy = test_policy();
        let mut unchanged = 0usize;
        for _ in 0..1000 {
            let masked = policy.mask(24.0, Classification::Normal);
            // 5-sigma bound on N(value, 0.02)
            assert!((23.9..=24.1).contains(&masked), "out of band: {masked}");
            if masked == 24.0 {
                unchanged += 1;
            }
        }
        // A continuous draw equals the input with probability ~0
        assert_eq!(unchanged, 0);
    }

    #[test]
    fn test_noise_draws_are_independent() {
        let mut policy = test_policy();
        let a = policy.mask(24.0, Classification::Normal);
        let b = policy.mask(24.0, Classification::Normal);
        assert_ne!(a, b);
    }

    #[test]
    fn test_seeded_policies_reproduce() {
        let mut a = test_policy();
        let mut b = test_policy();
        for _ in 0..10 {
            assert_eq!(
                a.mask(24.0, Classification::Normal),
                b.mask(24.0, Classification::Normal)
            );
        }
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        assert!(MaskPolicy::new(21.0, 30.0, 25.0).is_err());
        assert!(MaskPolicy::new(25.0, 25.0, 25.0).is_err());
    }
}
