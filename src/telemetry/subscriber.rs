// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT subscription to the inverter status topic.
//!
//! # Examples
//!
//! ```no_run
//! use inverter_bot::telemetry::TelemetrySubscriber;
//!
//! # async fn example() -> Result<(), inverter_bot::ProtocolError> {
//! let (subscriber, mut payloads) = TelemetrySubscriber::builder()
//!     .host("192.168.1.50")
//!     .credentials("user", "password")
//!     .build()
//!     .await?;
//!
//! while let Some(payload) = payloads.recv().await {
//!     println!("{} bytes", payload.len());
//! }
//!
//! subscriber.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::ProtocolError;

/// Topic the inverter monitor publishes readings on.
pub const DEFAULT_TOPIC: &str = "status";

/// Delay before polling the event loop again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Configuration for the telemetry subscription.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    topic: String,
    keep_alive: Duration,
    connection_timeout: Duration,
    channel_capacity: usize,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            topic: DEFAULT_TOPIC.to_string(),
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            channel_capacity: 32,
        }
    }
}

impl SubscriberConfig {
    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// A live subscription to the telemetry topic.
///
/// A background task drives the MQTT event loop and forwards every received
/// payload, undecoded, to the channel returned by
/// [`TelemetrySubscriberBuilder::build`]. Messages are taken at most once:
/// a reading lost in flight is simply superseded by the next one.
///
/// The subscription is re-issued after every reconnect. Dropping the
/// subscriber stops the background task and releases the connection.
#[derive(Debug)]
pub struct TelemetrySubscriber {
    client: AsyncClient,
    config: SubscriberConfig,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TelemetrySubscriber {
    /// Creates a new builder for configuring the subscription.
    #[must_use]
    pub fn builder() -> TelemetrySubscriberBuilder {
        TelemetrySubscriberBuilder::default()
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Returns the configuration used for this subscription.
    #[must_use]
    pub fn config(&self) -> &SubscriberConfig {
        &self.config
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.config.host,
            port = %self.config.port,
            "Disconnecting from MQTT broker"
        );

        self.client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl Drop for TelemetrySubscriber {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Builder for a [`TelemetrySubscriber`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use inverter_bot::telemetry::TelemetrySubscriber;
///
/// # async fn example() -> Result<(), inverter_bot::ProtocolError> {
/// let (subscriber, payloads) = TelemetrySubscriber::builder()
///     .host("192.168.1.50")
///     .port(1883)
///     .topic("status")
///     .keep_alive(Duration::from_secs(60))
///     .connection_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct TelemetrySubscriberBuilder {
    config: SubscriberConfig,
}

impl TelemetrySubscriberBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the telemetry topic (default: [`DEFAULT_TOPIC`]).
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.config.topic = topic.into();
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets how long to wait for the broker to accept the connection
    /// (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets how many undelivered payloads may be buffered (default: 32).
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity.max(1);
        self
    }

    /// Connects to the broker and subscribes to the telemetry topic.
    ///
    /// Returns the subscriber together with the receiving end of the
    /// payload channel.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host or topic is not set
    /// - The connection fails or times out
    pub async fn build(
        self,
    ) -> Result<(TelemetrySubscriber, mpsc::Receiver<Vec<u8>>), ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }
        if self.config.topic.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "telemetry topic is required".to_string(),
            ));
        }

        let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("inverter_bot_{}_{}", std::process::id(), counter);

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        let (payload_tx, payload_rx) = mpsc::channel(self.config.channel_capacity);
        let (connack_tx, connack_rx) = oneshot::channel();
        let connected = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(handle_subscriber_events(
            event_loop,
            client.clone(),
            self.config.topic.clone(),
            Arc::clone(&connected),
            payload_tx,
            connack_tx,
        ));

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    topic = %self.config.topic,
                    "Connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                task.abort();
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                task.abort();
                return Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )));
            }
        }

        let subscriber = TelemetrySubscriber {
            client,
            config: self.config,
            connected,
            task,
        };
        Ok((subscriber, payload_rx))
    }
}

/// Drives the MQTT event loop for the subscriber.
async fn handle_subscriber_events(
    mut event_loop: EventLoop,
    client: AsyncClient,
    topic: String,
    connected: Arc<AtomicBool>,
    payload_tx: mpsc::Sender<Vec<u8>>,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                connected.store(true, Ordering::Release);

                // Clean sessions drop subscriptions, so subscribe on every connect.
                // try_subscribe: awaiting here would stall the loop that drains the queue.
                if let Err(e) = client.try_subscribe(&topic, QoS::AtMostOnce) {
                    tracing::error!(topic = %topic, error = %e, "Failed to subscribe to telemetry");
                }
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::debug!(
                    topic = %publish.topic,
                    bytes = publish.payload.len(),
                    "MQTT message received"
                );
                if payload_tx.send(publish.payload.to_vec()).await.is_err() {
                    tracing::debug!("Telemetry receiver dropped, stopping event loop");
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                connected.store(false, Ordering::Release);
            }
            Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT event loop error");
                connected.store(false, Ordering::Release);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
