//! # In-Memory Bus Transport
//!
//! Connects the client to `geo-bus` brokers hosted in the same process.
//! Each subscription gets its own delivery task that drains the bus
//! subscription and invokes the handler.
//!
//! ```text
//! BrokerRegistry ── "host:port" ──► InMemoryBroker
//!                                        │ subscribe(filter)
//!                                        ▼
//!                         tokio task: recv() ─► DeliveryHandler
//! ```

use crate::domain::{BrokerEndpoint, InboundMessage, QoS, TransportError};
use crate::ports::{BrokerTransport, DeliveryHandler, TransportConnector};
use async_trait::async_trait;
use geo_bus::{BrokerRegistry, BusMessage, InMemoryBroker, MessagePublisher};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Opens [`BusTransport`]s to brokers started in a [`BrokerRegistry`].
#[derive(Clone)]
pub struct BusConnector {
    registry: Arc<BrokerRegistry>,
}

impl BusConnector {
    /// Connector over `registry`.
    pub fn new(registry: Arc<BrokerRegistry>) -> Self {
        Self { registry }
    }

    /// The registry brokers are looked up in.
    pub fn registry(&self) -> &Arc<BrokerRegistry> {
        &self.registry
    }
}

#[async_trait]
impl TransportConnector for BusConnector {
    type Transport = BusTransport;

    async fn connect(&self, endpoint: &BrokerEndpoint) -> Result<BusTransport, TransportError> {
        let broker = self
            .registry
            .get(&endpoint.host, endpoint.port)
            .ok_or_else(|| TransportError::ConnectionRefused(endpoint.to_string()))?;
        debug!(%endpoint, "Connected to bus broker");
        Ok(BusTransport::new(broker))
    }
}

/// Transport over one [`InMemoryBroker`].
pub struct BusTransport {
    broker: Arc<InMemoryBroker>,
    deliveries: Mutex<HashMap<String, JoinHandle<()>>>,
    connected: AtomicBool,
}

impl BusTransport {
    /// Transport bound to `broker`.
    pub fn new(broker: Arc<InMemoryBroker>) -> Self {
        Self {
            broker,
            deliveries: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// The broker this transport talks to.
    pub fn broker(&self) -> &Arc<InMemoryBroker> {
        &self.broker
    }

    /// Filters with a running delivery task.
    pub fn active_filters(&self) -> Vec<String> {
        let mut filters: Vec<String> = self.deliveries.lock().keys().cloned().collect();
        filters.sort();
        filters
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(TransportError::Disconnected)
        }
    }
}

fn to_inbound(message: BusMessage) -> InboundMessage {
    InboundMessage {
        topic: message.topic,
        payload: message.payload,
        qos: QoS::try_from(message.qos).unwrap_or_default(),
        retained: message.retained,
    }
}

#[async_trait]
impl BrokerTransport for BusTransport {
    async fn subscribe(
        &self,
        filter: &str,
        _qos: QoS,
        handler: DeliveryHandler,
    ) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let mut subscription = self
            .broker
            .subscribe(filter)
            .map_err(|e| TransportError::Rejected(e.to_string()))?;

        let task = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                handler(to_inbound(message));
            }
        });

        if let Some(previous) = self.deliveries.lock().insert(filter.to_owned(), task) {
            previous.abort();
        }
        trace!(filter, "Bus subscription started");
        Ok(())
    }

    async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
        self.ensure_connected()?;
        if let Some(task) = self.deliveries.lock().remove(filter) {
            task.abort();
            trace!(filter, "Bus subscription stopped");
        }
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retained: bool,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let mut message = BusMessage::new(topic, payload).with_qos(qos.level());
        if retained {
            message = message.retained();
        }
        self.broker
            .publish(message)
            .await
            .map(|_| ())
            .map_err(|e| TransportError::Rejected(e.to_string()))
    }

    async fn disconnect(&self, quiesce: Duration) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        if !quiesce.is_zero() {
            tokio::time::sleep(quiesce).await;
        }
        let deliveries: Vec<JoinHandle<()>> =
            self.deliveries.lock().drain().map(|(_, task)| task).collect();
        for task in deliveries {
            task.abort();
        }
        debug!("Bus transport disconnected");
    }
}

impl Drop for BusTransport {
    fn drop(&mut self) {
        for (_, task) in self.deliveries.get_mut().drain() {
            task.abort();
        }
    }
}
