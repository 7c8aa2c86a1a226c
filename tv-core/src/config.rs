//! Daemon configuration
//!
//! Both daemons read an optional JSON config file; every field has a
//! documented default so an empty file (or no file at all) yields a working
//! deployment against a local broker. A small set of environment variables
//! overrides the connection and provisioning paths, which is what container
//! deployments actually vary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tv_error::{Result, ThermoveilError};

use crate::constants::{alarms, control, thermal, thresholds};

/// Environment variable overriding the broker host
pub const ENV_MQTT_HOST: &str = "THERMOVEIL_MQTT_HOST";
/// Environment variable overriding the broker port
pub const ENV_MQTT_PORT: &str = "THERMOVEIL_MQTT_PORT";
/// Environment variable overriding the key file path
pub const ENV_KEY_FILE: &str = "THERMOVEIL_KEY_FILE";
/// Environment variable overriding the model file path
pub const ENV_MODEL_FILE: &str = "THERMOVEIL_MODEL_FILE";

/// MQTT broker endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_raw_topic() -> String {
    tv_protocol::RAW_TOPIC.to_string()
}

fn default_masked_topic() -> String {
    tv_protocol::MASKED_TOPIC.to_string()
}

fn default_key_file() -> PathBuf {
    PathBuf::from("secret.key")
}

fn default_model_file() -> PathBuf {
    PathBuf::from("model.json")
}

fn default_overheat() -> f64 {
    thresholds::OVERHEAT_C
}

fn default_undercool() -> f64 {
    thresholds::UNDERCOOL_C
}

fn default_baseline() -> f64 {
    thresholds::BASELINE_CENTER_C
}

fn default_prolonged() -> u64 {
    alarms::PROLONGED_SECS
}

fn default_setpoint() -> f64 {
    control::SETPOINT_C
}

fn default_night_start() -> u32 {
    alarms::NIGHT_START_HOUR
}

fn default_night_end() -> u32 {
    alarms::NIGHT_END_HOUR
}

/// Configuration for the producer-side processor daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default = "default_raw_topic")]
    pub raw_topic: String,
    #[serde(default = "default_masked_topic")]
    pub masked_topic: String,
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
    #[serde(default = "default_model_file")]
    pub model_file: PathBuf,
    #[serde(default = "default_overheat")]
    pub overheat_c: f64,
    #[serde(default = "default_undercool")]
    pub undercool_c: f64,
    #[serde(default = "default_baseline")]
    pub baseline_center_c: f64,
    #[serde(default = "default_prolonged")]
    pub prolonged_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            raw_topic: default_raw_topic(),
            masked_topic: default_masked_topic(),
            key_file: default_key_file(),
            model_file: default_model_file(),
            overheat_c: default_overheat(),
            undercool_c: default_undercool(),
            baseline_center_c: default_baseline(),
            prolonged_secs: default_prolonged(),
        }
    }
}

impl ProcessorConfig {
    /// Load from an optional config file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config: Self = load_json(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        apply_broker_env(&mut self.broker);
        if let Ok(path) = std::env::var(ENV_KEY_FILE) {
            self.key_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(ENV_MODEL_FILE) {
            self.model_file = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.undercool_c >= self.overheat_c {
            return Err(ThermoveilError::invalid_config(
                "undercool_c",
                "must be strictly below overheat_c",
            ));
        }
        if self.raw_topic.is_empty() || self.masked_topic.is_empty() {
            return Err(ThermoveilError::config("topics must not be empty"));
        }
        if self.raw_topic == self.masked_topic {
            return Err(ThermoveilError::config(
                "raw and masked topics must differ",
            ));
        }
        Ok(())
    }
}

/// PID gains and limits for the regulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub out_min: f64,
    pub out_max: f64,
    #[serde(default)]
    pub deadband: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: control::KP,
            ki: control::KI,
            kd: control::KD,
            out_min: control::OUT_MIN,
            out_max: control::OUT_MAX,
            deadband: control::DEADBAND,
        }
    }
}

/// Thermal model constants for the regulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalConfig {
    pub r: f64,
    pub c: f64,
    pub dt_secs: f64,
    pub ambient_c: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            r: thermal::R,
            c: thermal::C,
            dt_secs: thermal::DT_SECS,
            ambient_c: thermal::AMBIENT_C,
        }
    }
}

/// Configuration for the consumer-side regulator daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatorConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default = "default_masked_topic")]
    pub masked_topic: String,
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
    #[serde(default = "default_setpoint")]
    pub setpoint_c: f64,
    #[serde(default = "default_overheat")]
    pub overheat_c: f64,
    #[serde(default = "default_undercool")]
    pub undercool_c: f64,
    #[serde(default = "default_prolonged")]
    pub prolonged_secs: u64,
    #[serde(default = "default_night_start")]
    pub night_start_hour: u32,
    #[serde(default = "default_night_end")]
    pub night_end_hour: u32,
    #[serde(default)]
    pub pid: PidConfig,
    #[serde(default)]
    pub thermal: ThermalConfig,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            masked_topic: default_masked_topic(),
            key_file: default_key_file(),
            setpoint_c: default_setpoint(),
            overheat_c: default_overheat(),
            undercool_c: default_undercool(),
            prolonged_secs: default_prolonged(),
            night_start_hour: default_night_start(),
            night_end_hour: default_night_end(),
            pid: PidConfig::default(),
            thermal: ThermalConfig::default(),
        }
    }
}

impl RegulatorConfig {
    /// Load from an optional config file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config: Self = load_json(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        apply_broker_env(&mut self.broker);
        if let Ok(path) = std::env::var(ENV_KEY_FILE) {
            self.key_file = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.undercool_c >= self.overheat_c {
            return Err(ThermoveilError::invalid_config(
                "undercool_c",
                "must be strictly below overheat_c",
            ));
        }
        if self.night_start_hour >= 24 || self.night_end_hour >= 24 {
            return Err(ThermoveilError::invalid_config(
                "night window",
                "hours must be 0-23",
            ));
        }
        if self.pid.out_min >= self.pid.out_max {
            return Err(ThermoveilError::invalid_config(
                "pid.out_min",
                "must be less than pid.out_max",
            ));
        }
        for (field, value) in [
            ("thermal.r", self.thermal.r),
            ("thermal.c", self.thermal.c),
            ("thermal.dt_secs", self.thermal.dt_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ThermoveilError::invalid_config(field, "must be positive"));
            }
        }
        Ok(())
    }
}

fn load_json<T: serde::de::DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ThermoveilError::config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| ThermoveilError::config(format!("cannot parse {}: {e}", path.display())))
}

fn apply_broker_env(broker: &mut BrokerConfig) {
    if let Ok(host) = std::env::var(ENV_MQTT_HOST) {
        broker.host = host;
    }
    if let Ok(port) = std::env::var(ENV_MQTT_PORT) {
        if let Ok(port) = port.parse() {
            broker.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_processor_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.raw_topic, tv_protocol::RAW_TOPIC);
        assert_eq!(config.masked_topic, tv_protocol::MASKED_TOPIC);
        assert_eq!(config.overheat_c, 30.0);
        assert_eq!(config.undercool_c, 21.0);
        assert_eq!(config.baseline_center_c, 25.0);
        assert_eq!(config.prolonged_secs, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_regulator_defaults() {
        let config = RegulatorConfig::default();
        assert_eq!(config.setpoint_c, 25.0);
        assert_eq!(config.night_start_hour, 22);
        assert_eq!(config.night_end_hour, 5);
        assert_eq!(config.pid.kp, 2.0);
        assert_eq!(config.pid.ki, 0.1);
        assert_eq!(config.pid.kd, 0.05);
        assert_eq!(config.thermal.r, 10.0);
        assert_eq!(config.thermal.c, 5.0);
        assert_eq!(config.thermal.ambient_c, 22.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"broker": {{"host": "broker.internal"}}, "prolonged_secs": 45}}"#
        )
        .unwrap();

        let config = ProcessorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.broker.host, "broker.internal");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.prolonged_secs, 45);
        assert_eq!(config.overheat_c, 30.0);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let config = ProcessorConfig {
            undercool_c: 35.0,
            ..ProcessorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RegulatorConfig {
            night_start_hour: 24,
            ..RegulatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_topic_rejected() {
        let config = ProcessorConfig {
            masked_topic: default_raw_topic(),
            ..ProcessorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_file_is_config_error() {
        let err = ProcessorConfig::load(Some(Path::new("/nonexistent/tv.json"))).unwrap_err();
        assert!(matches!(err, ThermoveilError::Config(_)));
    }
}
