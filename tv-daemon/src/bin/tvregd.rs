//! Thermoveil Regulator Daemon (tvregd)
//!
//! Consumer-side half of the pipeline. Subscribes to the encrypted masked
//! topic, and for each delivered reading: decrypts, runs the PID controller
//! and the first-order thermal reconstruction against the masked stream,
//! re-anchors from trustworthy readings, and maintains the consumer-side
//! alarms (overheat/undercool level checks, anomaly-duration and
//! night-window trackers).
//!
//! The producer's anomaly flag is trusted verbatim - this daemon never
//! re-classifies readings.

use anyhow::Context;
use rumqttc::{Event, Packet};
use tracing::{error, info};

use tv_core::{ConsumerPipeline, RegulatorConfig};
use tv_daemon::{cli, logging, mqtt, sink};
use tv_protocol::Envelope;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // PHASE 1: Parse arguments
    let args = cli::parse("tvregd", VERSION, "Thermoveil HVAC regulator daemon");

    // PHASE 2: Initialize logging
    logging::init();
    info!("STARTUP: tvregd {} starting", VERSION);

    // PHASE 3: Load configuration (file + env overrides)
    let config = RegulatorConfig::load(args.config.as_deref())
        .context("failed to load regulator configuration")?;
    info!(
        "STARTUP: Setpoint {:.1}°C, band [{:.1}, {:.1}]°C, night window {}h-{}h",
        config.setpoint_c,
        config.undercool_c,
        config.overheat_c,
        config.night_start_hour,
        config.night_end_hour
    );

    // PHASE 4: Load required capabilities - fatal before the message loop
    let envelope = Envelope::from_key_file(&config.key_file)
        .context("failed to load envelope key")?;
    let mut pipeline = ConsumerPipeline::new(envelope, &config)
        .context("invalid regulator configuration")?;

    // PHASE 5: Signal handler for clean shutdown
    ctrlc::set_handler(|| {
        info!("SIGNAL: Received SIGINT/SIGTERM - shutting down");
        std::process::exit(0);
    })
    .context("failed to install signal handler")?;

    // PHASE 6: Connect and run the regulation loop
    let (client, mut eventloop) = mqtt::connect(&config.broker, "tvregd");

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected to broker");
                mqtt::subscribe(&client, &config.masked_topic).await;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match pipeline.handle(&publish.payload) {
                    Ok(outcome) => {
                        for alarm in &outcome.alarms {
                            sink::emit_alarm(alarm);
                        }
                        sink::emit_status(&outcome.status);
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
