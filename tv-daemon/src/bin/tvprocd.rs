//! Thermoveil Processor Daemon (tvprocd)
//!
//! Producer-side half of the masking pipeline. Subscribes to the encrypted
//! raw readings topic, and for each delivered reading: decrypts, classifies
//! it against the pre-fitted anomaly model, decides the outgoing (possibly
//! masked) value, tracks the prolonged-anomaly alarm, and re-encrypts to the
//! masked topic.
//!
//! # Failure Model
//! - Startup capability failures (config, key, model) are fatal - the daemon
//!   never enters the message loop without them.
//! - Per-message decode failures are dropped, counted, and logged; the loop
//!   never crashes on foreign bytes.
//! - Classifier failures degrade the reading to normal with a degraded-mode
//!   alarm event.

use anyhow::Context;
use rumqttc::{Event, Packet};
use tracing::{debug, error, info};

use tv_core::{BandModel, MaskPolicy, ProcessorConfig, ProducerPipeline};
use tv_daemon::{cli, logging, mqtt, sink};
use tv_protocol::Envelope;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // PHASE 1: Parse arguments
    let args = cli::parse("tvprocd", VERSION, "Thermoveil masking processor daemon");

    // PHASE 2: Initialize logging
    logging::init();
    info!("STARTUP: tvprocd {} starting", VERSION);

    // PHASE 3: Load configuration (file + env overrides)
    let config = ProcessorConfig::load(args.config.as_deref())
        .context("failed to load processor configuration")?;
    info!(
        "STARTUP: Topics: {} -> {}",
        config.raw_topic, config.masked_topic
    );

    // PHASE 4: Load required capabilities - fatal before the message loop
    let envelope = Envelope::from_key_file(&config.key_file)
        .context("failed to load envelope key")?;
    let model = BandModel::from_model_file(&config.model_file)
        .context("failed to load anomaly model")?;
    info!(
        "STARTUP: Anomaly model band: [{:.2}, {:.2}]",
        model.lower, model.upper
    );

    let policy = MaskPolicy::new(
        config.overheat_c,
        config.undercool_c,
        config.baseline_center_c,
    )
    .context("invalid masking policy configuration")?;

    let mut pipeline =
        ProducerPipeline::new(envelope, model, policy, config.prolonged_secs);

    // PHASE 5: Signal handler for clean shutdown
    ctrlc::set_handler(|| {
        info!("SIGNAL: Received SIGINT/SIGTERM - shutting down");
        std::process::exit(0);
    })
    .context("failed to install signal handler")?;

    // PHASE 6: Connect and run the message loop
    let (client, mut eventloop) = mqtt::connect(&config.broker, "tvprocd");

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected to broker");
                mqtt::subscribe(&client, &config.raw_topic).await;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match pipeline.handle(&publish.payload) {
                    Ok(outcome) => {
                        for alarm in &outcome.alarms {
                            sink::emit_alarm(alarm);
                        }
                        debug!(
                            temperature = outcome.reading.temperature,
                            anomaly = outcome.reading.anomaly,
                            "Masked reading ready"
                        );
                        if let Err(e) = client
                            .publish(
                                &config.masked_topic,
                                mqtt::DELIVERY_QOS,
                                false,
                                outcome.token.into_bytes(),
                            )
                            .await
                        {
                            error!(error = %e, "Failed to publish masked reading");
                        }
                    }
                    Err(err) if err.is_message_drop() => {
                        sink::emit_drop(&err, publish.payload.len(), pipeline.drops());
                    }
                    Err(err) => {
                        error!(error = %err, "Pipeline failure");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Transport error, retrying");
                tokio::time::sleep(mqtt::RECONNECT_BACKOFF).await;
            }
        }
    }
}
