//! Shared wire payloads for Thermoveil
//!
//! Defines the logical message schemas exchanged over the pub/sub transport,
//! plus the authenticated-encryption envelope that wraps them on the wire.
//! The schemas are independent of the wire encoding: payloads are JSON inside
//! an encrypted envelope token (see [`Envelope`]).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use tv_error::{Result, ThermoveilError};

pub mod envelope;

pub use envelope::Envelope;

/// Topic carrying encrypted raw readings from the ingest source
pub const RAW_TOPIC: &str = "dc/temperature/raw_encrypted";

/// Topic carrying encrypted masked readings to downstream consumers
pub const MASKED_TOPIC: &str = "dc/temperature/masked_encrypted";

/// Maximum accepted payload size on either topic (8KB)
///
/// Checked before any decryption work so oversize garbage is rejected
/// cheaply.
pub const MAX_PAYLOAD_SIZE: usize = 8 * 1024;

/// A raw sensor reading as published by the ingest source.
///
/// Wire form: `{"timestamp": "<RFC3339>", "value": <number>}`. The timestamp
/// must carry a UTC offset; a missing field or an offset-less timestamp is a
/// format error at decode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A masked reading as re-published by the processor.
///
/// Wire form: `{"timestamp": "<RFC3339>", "temperature": <number>,
/// "anomaly": <bool>}`. The `anomaly` flag is authoritative ground truth
/// from the producer-side classifier; consumers trust it rather than
/// recomputing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedReading {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub anomaly: bool,
}

impl MaskedReading {
    /// Build an outgoing masked reading.
    ///
    /// The temperature is rounded to two decimals here, at the wire
    /// boundary, so the masking policy itself can stay exact.
    pub fn new(timestamp: DateTime<Utc>, temperature: f64, anomaly: bool) -> Self {
        Self {
            timestamp,
            temperature: round2(temperature),
            anomaly,
        }
    }
}

/// Round a value to two decimal places for wire publication
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format an instant the way payloads carry it (RFC3339, seconds, `Z` suffix)
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a JSON payload into a typed record, mapping parse failures to the
/// format-error taxonomy.
fn parse_payload<'a, T: Deserialize<'a>>(plaintext: &'a [u8]) -> Result<T> {
    serde_json::from_slice(plaintext).map_err(|e| ThermoveilError::Format {
        reason: e.to_string(),
    })
}

/// Decode a decrypted raw-reading payload
pub fn parse_raw(plaintext: &[u8]) -> Result<RawReading> {
    parse_payload(plaintext)
}

/// Decode a decrypted masked-reading payload
pub fn parse_masked(plaintext: &[u8]) -> Result<MaskedReading> {
    parse_payload(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 23, 15, 0).unwrap()
    }

    #[test]
    fn test_raw_reading_roundtrip() {
        let reading = RawReading {
            timestamp: sample_instant(),
            value: 24.37,
        };
        let json = serde_json::to_vec(&reading).unwrap();
        let back = parse_raw(&json).unwrap();
        assert_eq!(back, reading);
    }

    #[test]
    fn test_raw_reading_wire_fields() {
        let json = r#"{"timestamp":"2025-06-01T23:15:00Z","value":24.5}"#;
        let reading = parse_raw(json.as_bytes()).unwrap();
        assert_eq!(reading.timestamp, sample_instant());
        assert!((reading.value - 24.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_field_is_format_error() {
        let json = r#"{"timestamp":"2025-06-01T23:15:00Z"}"#;
        let err = parse_raw(json.as_bytes()).unwrap_err();
        assert!(matches!(err, ThermoveilError::Format { .. }));
    }

    #[test]
    fn test_malformed_timestamp_is_format_error() {
        let json = r#"{"timestamp":"yesterday-ish","value":24.5}"#;
        let err = parse_raw(json.as_bytes()).unwrap_err();
        assert!(matches!(err, ThermoveilError::Format { .. }));

        // A local time without an offset is also rejected
        let json = r#"{"timestamp":"2025-06-01T23:15:00","value":24.5}"#;
        assert!(parse_raw(json.as_bytes()).is_err());
    }

    #[test]
    fn test_masked_reading_rounds_to_two_decimals() {
        let masked = MaskedReading::new(sample_instant(), 25.04837, true);
        assert!((masked.temperature - 25.05).abs() < f64::EPSILON);

        // Values already at two decimals survive exactly
        let masked = MaskedReading::new(sample_instant(), 30.5, false);
        assert_eq!(masked.temperature, 30.5);
    }

    #[test]
    fn test_masked_reading_roundtrip() {
        let masked = MaskedReading::new(sample_instant(), 25.01, true);
        let json = serde_json::to_vec(&masked).unwrap();
        let back = parse_masked(&json).unwrap();
        assert_eq!(back, masked);
    }

    #[test]
    fn test_timestamp_formatting_uses_z_suffix() {
        assert_eq!(format_timestamp(sample_instant()), "2025-06-01T23:15:00Z");
    }
}
