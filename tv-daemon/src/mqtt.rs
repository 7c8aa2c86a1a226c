//! MQTT transport binding
//!
//! The pipelines only require "publish(topic, bytes)" and delivered-message
//! bytes; everything here is plumbing around rumqttc. Delivery is
//! at-most-once (QoS 0) with no ordering guarantee across restarts, matching
//! the pipeline's assumptions.

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tracing::{error, info};

use tv_core::BrokerConfig;
use tv_protocol::MAX_PAYLOAD_SIZE;

/// Delivery QoS for both topics
pub const DELIVERY_QOS: QoS = QoS::AtMostOnce;

/// Outstanding-request capacity for the async client
const CLIENT_CAPACITY: usize = 64;

/// Backoff after a transport error before polling again
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Build the MQTT client and its event loop for a daemon.
pub fn connect(broker: &BrokerConfig, client_id: &str) -> (AsyncClient, EventLoop) {
    info!(
        "STARTUP: Broker: {}:{} (client id {client_id})",
        broker.host, broker.port
    );

    let mut options = MqttOptions::new(client_id, &broker.host, broker.port);
    options.set_keep_alive(Duration::from_secs(30));
    options.set_max_packet_size(MAX_PAYLOAD_SIZE, MAX_PAYLOAD_SIZE);
    options.set_clean_session(true);

    AsyncClient::new(options, CLIENT_CAPACITY)
}

/// Subscribe to the daemon's inbound topic.
///
/// Called on every ConnAck so subscriptions survive broker reconnects.
pub async fn subscribe(client: &AsyncClient, topic: &str) {
    info!("Subscribing to topic: {topic}");
    if let Err(e) = client.subscribe(topic, DELIVERY_QOS).await {
        error!(error = %e, topic, "subscribe request failed");
    }
}
