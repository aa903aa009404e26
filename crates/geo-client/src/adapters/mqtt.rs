//! # MQTT Transport (rumqttc)
//!
//! Requests are queued on the rumqttc `AsyncClient`; a spawned task drives
//! the `EventLoop` and routes inbound publishes to every handler whose
//! filter matches the topic.
//!
//! ```text
//! AsyncClient ──requests──► EventLoop (task) ──► broker
//!                               │
//!                   Incoming::Publish ─► routes[filter.matches(topic)] ─► handler
//! ```

use crate::domain::{BrokerEndpoint, InboundMessage, QoS, TransportError};
use crate::ports::{BrokerTransport, DeliveryHandler, TransportConnector};
use async_trait::async_trait;
use geo_bus::TopicFilter;
use parking_lot::{Mutex, RwLock};
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Default keep-alive interval.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Default wait for the broker's CONNACK.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request queue capacity.
pub const DEFAULT_REQUEST_CAPACITY: usize = 64;

type Routes = Arc<RwLock<HashMap<String, (TopicFilter, DeliveryHandler)>>>;

/// Opens MQTT connections with rumqttc.
#[derive(Debug, Clone)]
pub struct MqttConnector {
    client_id_prefix: String,
    keep_alive: Duration,
    connect_timeout: Duration,
    capacity: usize,
}

impl Default for MqttConnector {
    fn default() -> Self {
        Self {
            client_id_prefix: "geo-client".to_owned(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            capacity: DEFAULT_REQUEST_CAPACITY,
        }
    }
}

impl MqttConnector {
    /// Connector with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix for generated client ids.
    #[must_use]
    pub fn with_client_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.client_id_prefix = prefix.into();
        self
    }

    /// Keep-alive interval.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// How long to wait for CONNACK.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn options(&self, endpoint: &BrokerEndpoint) -> MqttOptions {
        let client_id = format!("{}-{}", self.client_id_prefix, Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id, endpoint.host.clone(), endpoint.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        options
    }
}

async fn await_connack(event_loop: &mut EventLoop) -> Result<(), TransportError> {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return match ack.code {
                    ConnectReturnCode::Success => Ok(()),
                    code => Err(TransportError::ConnectionRefused(format!("{code:?}"))),
                };
            }
            Ok(_) => {}
            Err(e) => return Err(TransportError::ConnectionRefused(e.to_string())),
        }
    }
}

#[async_trait]
impl TransportConnector for MqttConnector {
    type Transport = MqttTransport;

    async fn connect(&self, endpoint: &BrokerEndpoint) -> Result<MqttTransport, TransportError> {
        let (client, mut event_loop) = AsyncClient::new(self.options(endpoint), self.capacity);

        tokio::time::timeout(self.connect_timeout, await_connack(&mut event_loop))
            .await
            .map_err(|_| TransportError::Timeout)??;
        debug!(%endpoint, "Connected to MQTT broker");

        let routes: Routes = Arc::new(RwLock::new(HashMap::new()));
        let driver = tokio::spawn(drive(event_loop, Arc::clone(&routes)));

        Ok(MqttTransport {
            client,
            routes,
            driver: Mutex::new(Some(driver)),
        })
    }
}

async fn drive(mut event_loop: EventLoop, routes: Routes) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let handlers: Vec<DeliveryHandler> = routes
                    .read()
                    .values()
                    .filter(|(filter, _)| filter.matches(&publish.topic))
                    .map(|(_, handler)| Arc::clone(handler))
                    .collect();
                trace!(topic = %publish.topic, handlers = handlers.len(), "Inbound publish");

                let message = InboundMessage {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                    qos: from_mqtt_qos(publish.qos),
                    retained: publish.retain,
                };
                for handler in handlers {
                    handler(message.clone());
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("MQTT event loop finished");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "MQTT event loop stopped");
                break;
            }
        }
    }
}

fn to_mqtt_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

fn from_mqtt_qos(qos: rumqttc::QoS) -> QoS {
    match qos {
        rumqttc::QoS::AtMostOnce => QoS::AtMostOnce,
        rumqttc::QoS::AtLeastOnce => QoS::AtLeastOnce,
        rumqttc::QoS::ExactlyOnce => QoS::ExactlyOnce,
    }
}

/// Transport over one MQTT connection.
pub struct MqttTransport {
    client: AsyncClient,
    routes: Routes,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl MqttTransport {
    fn ensure_running(&self) -> Result<(), TransportError> {
        match self.driver.lock().as_ref() {
            Some(driver) if !driver.is_finished() => Ok(()),
            _ => Err(TransportError::Disconnected),
        }
    }
}

#[async_trait]
impl BrokerTransport for MqttTransport {
    async fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        handler: DeliveryHandler,
    ) -> Result<(), TransportError> {
        self.ensure_running()?;
        let parsed =
            TopicFilter::parse(filter).map_err(|e| TransportError::Rejected(e.to_string()))?;
        self.routes
            .write()
            .insert(filter.to_owned(), (parsed, handler));

        if let Err(e) = self.client.subscribe(filter, to_mqtt_qos(qos)).await {
            self.routes.write().remove(filter);
            return Err(TransportError::Rejected(e.to_string()));
        }
        Ok(())
    }

    async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
        self.ensure_running()?;
        self.client
            .unsubscribe(filter)
            .await
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        self.routes.write().remove(filter);
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retained: bool,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.ensure_running()?;
        self.client
            .publish(topic, to_mqtt_qos(qos), retained, payload)
            .await
            .map_err(|e| TransportError::Rejected(e.to_string()))
    }

    async fn disconnect(&self, quiesce: Duration) {
        let driver = self.driver.lock().take();
        let Some(mut driver) = driver else {
            return;
        };
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "MQTT disconnect request failed");
        }
        if tokio::time::timeout(quiesce, &mut driver).await.is_err() {
            driver.abort();
        }
        self.routes.write().clear();
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.get_mut().take() {
            driver.abort();
        }
    }
}
