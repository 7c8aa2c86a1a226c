//! Anomaly classification capability
//!
//! The classifier is an injected collaborator: a binary predictor fitted
//! offline on a quiescent baseline window and supplied to the pipeline as an
//! opaque capability. The core never hardcodes a specific algorithm - any
//! implementation of [`AnomalyClassifier`] (including a deterministic test
//! double) substitutes without caller changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use tv_error::{Result, ThermoveilError};

/// Binary judgment for a single reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    Anomalous,
}

impl Classification {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, Classification::Anomalous)
    }
}

/// A pre-fitted binary anomaly predictor.
///
/// Must be deterministic per call and carry no memory across calls; temporal
/// behavior (prolonged conditions) lives in the tracker, not here. Batch
/// invocation decomposes into independent per-value calls.
///
/// Returns `Err` when the backing capability is unavailable; pipelines
/// recover by treating the reading as normal and emitting a degraded-mode
/// event.
pub trait AnomalyClassifier {
    fn classify(&self, value: f64) -> Result<Classification>;
}

/// The shipped predictor: a decision band fitted offline.
///
/// Training produces a JSON model file holding the band learned from the
/// quiescent baseline window; anything outside the band is anomalous.
/// Training and persistence are external - this type only loads and applies
/// an already-fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandModel {
    /// Lower edge of the normal band (°C)
    pub lower: f64,
    /// Upper edge of the normal band (°C)
    pub upper: f64,
}

impl BandModel {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(ThermoveilError::invalid_config(
                "model band",
                format!("invalid decision band [{lower}, {upper}]"),
            ));
        }
        Ok(Self { lower, upper })
    }

    /// Load a fitted model from its JSON file.
    ///
    /// Failure is fatal at daemon startup - the processor must not run
    /// without its classifier.
    pub fn from_model_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ThermoveilError::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let model: BandModel =
            serde_json::from_str(&contents).map_err(|e| ThermoveilError::ModelLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !model.lower.is_finite() || !model.upper.is_finite() || model.lower >= model.upper {
            return Err(ThermoveilError::ModelLoad {
                path: path.to_path_buf(),
                reason: format!("invalid decision band [{}, {}]", model.lower, model.upper),
            });
        }
        Ok(model)
    }
}

impl AnomalyClassifier for BandModel {
    fn classify(&self, value: f64) -> Result<Classification> {
        if value < self.lower || value > self.upper {
            Ok(Classification::Anomalous)
        } else {
            Ok(Classification::Normal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_band_classification() {
        let model = BandModel::new(24.0, 26.0).unwrap();
        assert_eq!(model.classify(25.0).unwrap(), Classification::Normal);
        assert_eq!(model.classify(24.0).unwrap(), Classification::Normal);
        assert_eq!(model.classify(26.0).unwrap(), Classification::Normal);
        assert_eq!(model.classify(23.0).unwrap(), Classification::Anomalous);
        assert_eq!(model.classify(31.0).unwrap(), Classification::Anomalous);
    }

    #[test]
    fn test_batch_decomposes_to_per_value_calls() {
        let model = BandModel::new(24.0, 26.0).unwrap();
        let inputs = [25.0, 55.0, 24.5, 100.0];
        let expected = [false, true, false, true];
        for (value, anomalous) in inputs.iter().zip(expected) {
            assert_eq!(model.classify(*value).unwrap().is_anomalous(), anomalous);
        }
    }

    #[test]
    fn test_model_file_roundtrip() {
        let model = BandModel::new(23.5, 26.5).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&model).unwrap()).unwrap();

        let loaded = BandModel::from_model_file(file.path()).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_missing_or_corrupt_model_is_load_error() {
        let err = BandModel::from_model_file("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, ThermoveilError::ModelLoad { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = BandModel::from_model_file(file.path()).unwrap_err();
        assert!(matches!(err, ThermoveilError::ModelLoad { .. }));
    }

    #[test]
    fn test_inverted_band_rejected() {
        assert!(BandModel::new(26.0, 24.0).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"lower": 26.0, "upper": 24.0}}"#).unwrap();
        assert!(BandModel::from_model_file(file.path()).is_err());
    }
}
