//! Producer-side processor pipeline
//!
//! Per inbound reading: decode, classify, track the prolonged-anomaly
//! condition, mask, and re-encrypt. The outgoing anomaly flag is the
//! classifier's verdict - downstream consumers trust it rather than
//! recomputing.

use tracing::warn;

use tv_error::Result;
use tv_protocol::{format_timestamp, Envelope, MaskedReading};

use crate::alarm::{AlarmEvent, AlarmKind};
use crate::classify::{AnomalyClassifier, Classification};
use crate::mask::MaskPolicy;
use crate::pipeline::DropCounters;
use crate::tracker::ProlongedTracker;

/// Everything the daemon must act on for one processed reading
#[derive(Debug)]
pub struct ProducerOutcome {
    /// Encrypted masked reading, ready to publish
    pub token: String,
    /// The masked reading that was encoded (for status reporting)
    pub reading: MaskedReading,
    /// Alarm events raised while processing this reading
    pub alarms: Vec<AlarmEvent>,
}

/// One per-message transaction: decode -> classify -> track -> mask -> encode
pub struct ProducerPipeline<C> {
    envelope: Envelope,
    classifier: C,
    policy: MaskPolicy,
    prolonged: ProlongedTracker,
    drops: DropCounters,
}

impl<C: AnomalyClassifier> ProducerPipeline<C> {
    pub fn new(
        envelope: Envelope,
        classifier: C,
        policy: MaskPolicy,
        prolonged_secs: u64,
    ) -> Self {
        Self {
            envelope,
            classifier,
            policy,
            prolonged: ProlongedTracker::from_secs(prolonged_secs),
            drops: DropCounters::default(),
        }
    }

    /// Process one delivered payload.
    ///
    /// Decode failures are counted and returned; the caller logs one
    /// structured diagnostic and continues the loop. A classifier failure
    /// degrades the reading to normal and raises a `Degraded` event instead
    /// of dropping the message.
    pub fn handle(&mut self, payload: &[u8]) -> Result<ProducerOutcome> {
        let reading = match self.envelope.decode_raw(payload) {
            Ok(reading) => reading,
            Err(err) => {
                self.drops.record(&err);
                return Err(err);
            }
        };

        let mut alarms = Vec::new();

        let classification = match self.classifier.classify(reading.value) {
            Ok(classification) => classification,
            Err(err) => {
                warn!(error = %err, "classifier unavailable, treating reading as normal");
                alarms.push(AlarmEvent::new(
                    AlarmKind::Degraded,
                    reading.timestamp,
                    format!("classifier unavailable: {err}"),
                ));
                Classification::Normal
            }
        };
        let anomalous = classification.is_anomalous();

        if self.prolonged.observe(anomalous, reading.timestamp) {
            let since = self
                .prolonged
                .condition_start()
                .map(format_timestamp)
                .unwrap_or_default();
            alarms.push(AlarmEvent::new(
                AlarmKind::ProlongedAnomaly,
                reading.timestamp,
                format!("anomalous readings since {since}"),
            ));
        }

        let out_value = self.policy.mask(reading.value, classification);
        let masked = MaskedReading::new(reading.timestamp, out_value, anomalous);
        let token = self.envelope.encode_masked(&masked)?;

        Ok(ProducerOutcome {
            token,
            reading: masked,
            alarms,
        })
    }

    /// Messages dropped so far at the decode boundary
    pub fn drops(&self) -> DropCounters {
        self.drops
    }
}
