use std::time::Duration;

use anyhow::Context as _;
use log::{debug, error, info};
use rumqttc::{MqttOptions, QoS};

use crate::config;
use crate::messages::NearableEvent;

/// Publishes nearable events as JSON.
#[derive(Debug, Clone)]
pub struct MqttClient {
    client: rumqttc::AsyncClient,
    publisher_id: String,
    topic_path: String,
}

impl MqttClient {
    pub fn new(config: &config::MqttConfig) -> (Self, rumqttc::EventLoop) {
        let publisher_id = config
            .publisher_id
            .clone()
            .unwrap_or_else(|| "nearable-rs".to_string());

        let mut mqttoptions = MqttOptions::new(
            publisher_id.clone(),
            config.host.clone(),
            config.port.unwrap_or(1883),
        );

        mqttoptions.set_keep_alive(Duration::from_secs(config.keep_alive_seconds.unwrap_or(5)));

        if let (Some(username), Some(password)) =
            (config.username.as_ref(), config.password.as_ref())
        {
            mqttoptions.set_credentials(username.clone(), password.clone());
        }

        let (client, eventloop) = rumqttc::AsyncClient::new(mqttoptions, 10);

        (
            MqttClient {
                client,
                publisher_id,
                topic_path: config
                    .topic_path
                    .clone()
                    .unwrap_or_else(|| "nearables".to_string()),
            },
            eventloop,
        )
    }

    /// Drive the connection. Publishes only leave once this is polled.
    pub async fn event_loop(eventloop: &mut rumqttc::EventLoop) {
        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::ConnAck(_))) => {
                    debug!("Connection acknowledged");
                }
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::PubAck(_))) => {
                    debug!("Publish acknowledged");
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Error polling MQTT event loop: {:?}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    pub fn topic_for(&self, event: &NearableEvent) -> String {
        let channel_name = match &event.name {
            Some(name) => sanitize_name(name),
            None => sanitize_name(&event.nearable.identifier().to_string()),
        };
        format!("{}/{}/{}", self.topic_path, self.publisher_id, channel_name)
    }

    /// Queue an event for publishing. Fails instead of waiting when the
    /// request queue is full, e.g. while the broker is unreachable.
    pub fn publish(&self, event: &NearableEvent) -> anyhow::Result<()> {
        let topic = self.topic_for(event);
        debug!("Publishing {:?} event on {}", event.kind, topic);

        let payload = serde_json::to_string(event).context("serializing nearable event")?;
        self.client
            .try_publish(topic.clone(), QoS::AtMostOnce, false, payload)
            .with_context(|| format!("publishing to {}", topic))
    }

    pub fn disconnect(&self) -> Result<(), rumqttc::ClientError> {
        info!("Disconnecting MQTT client");
        self.client.try_disconnect()
    }
}

fn sanitize_name(name: &str) -> String {
    // Lowercase, every non-alphanumeric character becomes an underscore
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
}
