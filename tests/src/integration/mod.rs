//! # Integration Flows
//!
//! The client runs against `geo-bus` brokers registered under the endpoints
//! a real deployment would use: a manager serving the retained gateway
//! catalog and one or more gateways.
//!
//! ```text
//! BrokerRegistry
//!   ├── localhost:1883  manager   (retained catalog)
//!   ├── gw-fine:1884    gateway
//!   └── gw-coarse:1885  gateway
//! ```

pub mod discovery;
pub mod subscription;

use geo_bus::{BrokerRegistry, BusMessage, InMemoryBroker, MessagePublisher};
use geo_client::{
    BrokerEndpoint, BusConnector, ClientConfig, GatewayDiscovery, S2Geometry, SeededRandomSource,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Catalog topic the manager answers on.
pub const CATALOG_TOPIC: &str = "/api/gateway/info/all";

/// Region prefix containing (1.0, 1.0).
pub const FINE_REGION: &str = "/0/2/0";

/// Coarser region containing (1.0, 1.0).
pub const COARSE_REGION: &str = "/0";

/// Brokers of one simulated deployment.
pub struct Deployment {
    pub registry: Arc<BrokerRegistry>,
    pub manager: Arc<InMemoryBroker>,
}

impl Deployment {
    /// Registry with only the manager broker started.
    pub fn new() -> Self {
        crate::init_tracing();
        let registry = Arc::new(BrokerRegistry::new());
        let manager = registry.start("localhost", 1883);
        Self { registry, manager }
    }

    /// Start a gateway broker.
    pub fn gateway(&self, host: &str, port: u16) -> Arc<InMemoryBroker> {
        self.registry.start(host, port)
    }

    /// Publish the retained catalog on the manager.
    pub async fn publish_catalog(&self, catalog: &str) {
        self.manager
            .publish(BusMessage::new(CATALOG_TOPIC, catalog).with_qos(2).retained())
            .await
            .unwrap();
    }

    /// Discovery over this deployment with default settings.
    pub fn discovery(&self) -> GatewayDiscovery<BusConnector> {
        self.discovery_with(ClientConfig::default())
    }

    /// Discovery over this deployment with `config`.
    pub fn discovery_with(&self, config: ClientConfig) -> GatewayDiscovery<BusConnector> {
        GatewayDiscovery::new(
            BusConnector::new(Arc::clone(&self.registry)),
            Arc::new(S2Geometry::new()),
            Arc::new(SeededRandomSource::new(7)),
            config,
        )
        .unwrap()
    }
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON catalog from `(region, host, port)` triples.
pub fn catalog(entries: &[(&str, &str, u16)]) -> String {
    let records: Vec<serde_json::Value> = entries
        .iter()
        .map(|(topic, host, port)| {
            serde_json::json!({
                "topic": topic,
                "broker_info": { "host": host, "port": port },
            })
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}

/// Stand-in for the gateway's forwarding service: republishes every
/// `/forward/<cell>` message on `<cell>`.
pub fn spawn_forwarder(broker: Arc<InMemoryBroker>, prefix: &'static str) -> JoinHandle<()> {
    let mut inbox = broker.subscribe(&format!("{prefix}/#")).unwrap();
    tokio::spawn(async move {
        while let Some(message) = inbox.recv().await {
            if let Some(topic) = message.topic.strip_prefix(prefix) {
                let forwarded = BusMessage::new(topic, message.payload.clone());
                let _ = broker.publish(forwarded).await;
            }
        }
    })
}

/// Endpoint helper.
pub fn endpoint(host: &str, port: u16) -> BrokerEndpoint {
    BrokerEndpoint::new(host, port)
}
