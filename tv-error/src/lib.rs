//! Unified error handling for Thermoveil
//!
//! This crate provides a single error type used across all Thermoveil
//! components. It uses thiserror for ergonomic error definitions with proper
//! Display and Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using ThermoveilError
pub type Result<T> = std::result::Result<T, ThermoveilError>;

/// Unified error type for all Thermoveil operations
#[derive(thiserror::Error, Debug)]
pub enum ThermoveilError {
    // ============================================================================
    // I/O and Provisioning Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to load encryption key {path}: {reason}")]
    KeyLoad {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to load anomaly model {path}: {reason}")]
    ModelLoad {
        path: PathBuf,
        reason: String,
    },

    // ============================================================================
    // Envelope and Payload Errors
    // ============================================================================
    #[error("Envelope authentication failed")]
    Authentication,

    #[error("Malformed payload: {reason}")]
    Format {
        reason: String,
    },

    #[error("Invalid timestamp {value:?}: {reason}")]
    Timestamp {
        value: String,
        reason: String,
    },

    #[error("Payload too large: {size} bytes (max {max_size} bytes)")]
    PayloadTooLarge {
        size: usize,
        max_size: usize,
    },

    // ============================================================================
    // Capability Errors
    // ============================================================================
    #[error("Anomaly classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("Transport error: {0}")]
    Transport(String),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl ThermoveilError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a malformed-payload error
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration value error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error from a string
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether this error is an envelope authentication failure.
    ///
    /// Callers use this to decide what is safe to log: after an
    /// authentication failure the payload must never be echoed.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    /// Whether this error should be recovered at the single-message boundary
    /// (dropped and counted) rather than treated as fatal.
    pub fn is_message_drop(&self) -> bool {
        matches!(
            self,
            Self::Authentication
                | Self::Format { .. }
                | Self::Timestamp { .. }
                | Self::PayloadTooLarge { .. }
        )
    }
}

// Allow converting from String to ThermoveilError
impl From<String> for ThermoveilError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to ThermoveilError
impl From<&str> for ThermoveilError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_drop_classification() {
        assert!(ThermoveilError::Authentication.is_message_drop());
        assert!(ThermoveilError::format("truncated").is_message_drop());
        assert!(!ThermoveilError::config("bad broker").is_message_drop());
        assert!(!ThermoveilError::ClassifierUnavailable("gone".into()).is_message_drop());
    }

    #[test]
    fn test_authentication_is_flagged() {
        assert!(ThermoveilError::Authentication.is_authentication());
        assert!(!ThermoveilError::format("oops").is_authentication());
    }

    #[test]
    fn test_display_messages() {
        let err = ThermoveilError::PayloadTooLarge {
            size: 9000,
            max_size: 8192,
        };
        assert_eq!(
            err.to_string(),
            "Payload too large: 9000 bytes (max 8192 bytes)"
        );

        let err = ThermoveilError::invalid_config("overheat_c", "must exceed undercool_c");
        assert!(err.to_string().contains("overheat_c"));
    }
}
