//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the client **requires** from its host: a broker transport,
//! a way to open one, the geometric covering primitive, and randomness.

use crate::domain::{BrokerEndpoint, CellId, ClientConfig, InboundMessage, QoS, TransportError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked for every message matching a subscription.
///
/// Runs on a transport-owned task, concurrently with the caller's own
/// subscribe/unsubscribe/publish calls.
pub type DeliveryHandler = Arc<dyn Fn(InboundMessage) + Send + Sync>;

/// An open connection to a publish/subscribe broker.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct LoggingTransport;
///
/// #[async_trait]
/// impl BrokerTransport for LoggingTransport {
///     async fn publish(&self, topic: &str, qos: QoS, retained: bool, payload: Vec<u8>)
///         -> Result<(), TransportError>
///     {
///         tracing::info!(topic, %qos, retained, len = payload.len(), "publish");
///         Ok(())
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Subscribe to a topic filter; matching messages go to `handler`.
    async fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        handler: DeliveryHandler,
    ) -> Result<(), TransportError>;

    /// Drop a subscription.
    async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError>;

    /// Publish a message.
    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retained: bool,
        payload: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// Close the connection, allowing up to `quiesce` for in-flight work.
    async fn disconnect(&self, quiesce: Duration);
}

/// Opens transports to broker endpoints.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Transport produced by this connector.
    type Transport: BrokerTransport + 'static;

    /// Connect to `endpoint`.
    async fn connect(&self, endpoint: &BrokerEndpoint) -> Result<Self::Transport, TransportError>;
}

/// Hierarchical spatial partition of the sphere.
pub trait CellGeometry: Send + Sync {
    /// Leaf cell containing the point.
    fn cell_at(&self, lat: f64, lng: f64) -> CellId;

    /// At most `max_cells` cells, none finer than `max_level`, that together
    /// contain the disc of `radius_km` around the point.
    fn cover(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        max_level: u8,
        max_cells: usize,
    ) -> Vec<CellId>;
}

/// Injected randomness for gateway tie-breaking.
pub trait RandomSource: Send + Sync {
    /// Value in `0..max` (0 when `max` is 0).
    fn random_usize(&self, max: usize) -> usize;
}

/// Source of client configuration.
pub trait ConfigProvider: Send + Sync {
    /// Current configuration.
    fn client_config(&self) -> ClientConfig;
}
