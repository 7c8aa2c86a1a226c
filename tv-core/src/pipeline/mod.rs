//! Per-message pipeline transactions
//!
//! Both pipelines are pure transaction processors: `handle(bytes)` consumes
//! one delivered payload and returns everything the hosting daemon must act
//! on (outgoing token, status, alarm events). All I/O - transport, alarm
//! sink, logging - stays in the thin daemon adapters, so the pipelines are
//! fully testable without a live broker.
//!
//! Each pipeline owns all of its mutable state (trackers, controller,
//! thermal estimate) and processes one message to completion before the
//! next; hosting code must not call `handle` concurrently on one instance.

pub mod consumer;
pub mod producer;

pub use consumer::{ConsumerOutcome, ConsumerPipeline, RegulatorStatus};
pub use producer::{ProducerOutcome, ProducerPipeline};

use tv_error::ThermoveilError;

/// Counters for messages dropped at the single-message boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounters {
    /// Envelope authentication failures (tamper or wrong key)
    pub authentication: u64,
    /// Malformed payloads, bad timestamps, oversize messages
    pub format: u64,
}

impl DropCounters {
    /// Record a message-boundary failure in the matching counter
    pub fn record(&mut self, err: &ThermoveilError) {
        match err {
            ThermoveilError::Authentication => self.authentication += 1,
            ThermoveilError::Format { .. }
            | ThermoveilError::Timestamp { .. }
            | ThermoveilError::PayloadTooLarge { .. } => self.format += 1,
            _ => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.authentication + self.format
    }
}
