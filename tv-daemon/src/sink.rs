//! Alarm and observability sink
//!
//! The pipelines return structured events; this sink renders them onto the
//! tracing stream. Swapping the transport (log file, metrics daemon) means
//! swapping this module, not the pipelines.

use tracing::{info, warn};

use tv_core::{AlarmEvent, DropCounters, RegulatorStatus};
use tv_error::ThermoveilError;
use tv_protocol::format_timestamp;

/// Emit one alarm event.
pub fn emit_alarm(event: &AlarmEvent) {
    warn!(
        kind = event.kind.as_str(),
        timestamp = %format_timestamp(event.timestamp),
        detail = %event.detail,
        "ALARM"
    );
}

/// Emit the regulator's per-message status line.
pub fn emit_status(status: &RegulatorStatus) {
    info!(
        timestamp = %format_timestamp(status.timestamp),
        measured = format_args!("{:.2}", status.measured),
        control = format_args!("{:.2}", status.control),
        estimate = format_args!("{:.2}", status.estimate),
        anomaly = status.anomaly,
        "HVAC status"
    );
}

/// Emit one structured drop diagnostic for a rejected message.
///
/// Logs the reason and payload length only - payload contents are never
/// echoed, and plaintext never exists for authentication failures.
pub fn emit_drop(err: &ThermoveilError, payload_len: usize, drops: DropCounters) {
    warn!(
        reason = %err,
        payload_len,
        dropped_auth = drops.authentication,
        dropped_format = drops.format,
        "Dropping message"
    );
}
