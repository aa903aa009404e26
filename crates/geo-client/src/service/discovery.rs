use super::location::LocationClient;
use crate::domain::{
    cell_to_topic, parse_catalog, select_gateway, BrokerRole, ClientConfig, GatewayRecord,
    GeoClientError, InboundMessage, TransportOperation,
};
use crate::ports::{
    BrokerTransport, CellGeometry, ConfigProvider, DeliveryHandler, RandomSource,
    TransportConnector,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, trace, warn};

/// Grace period for the manager connection to flush before it is closed.
pub const MANAGER_QUIESCE: Duration = Duration::from_millis(100);

/// One-shot gateway discovery.
///
/// ```text
/// Connecting ──► AwaitingCatalog ──► EmptyCheck ──► Selection ──► GatewayConnect
///     │                │                  │              │              │
///     ▼                ▼                  ▼              ▼              ▼
/// TransportConnect   Timeout         GatewayInfo   NoGatewayMatch  TransportConnect
/// ```
///
/// The manager connection is closed once the catalog round-trip ends,
/// whatever its outcome.
pub struct GatewayDiscovery<C: TransportConnector> {
    connector: C,
    geometry: Arc<dyn CellGeometry>,
    random: Arc<dyn RandomSource>,
    config: ClientConfig,
}

impl<C: TransportConnector> GatewayDiscovery<C> {
    /// Create a discovery client.
    ///
    /// # Errors
    ///
    /// Returns `GeoClientError::Config` when `config` fails validation.
    pub fn new(
        connector: C,
        geometry: Arc<dyn CellGeometry>,
        random: Arc<dyn RandomSource>,
        config: ClientConfig,
    ) -> Result<Self, GeoClientError> {
        config.validate()?;
        Ok(Self {
            connector,
            geometry,
            random,
            config,
        })
    }

    /// Create a discovery client configured by `provider`.
    pub fn from_provider(
        connector: C,
        geometry: Arc<dyn CellGeometry>,
        random: Arc<dyn RandomSource>,
        provider: &dyn ConfigProvider,
    ) -> Result<Self, GeoClientError> {
        Self::new(connector, geometry, random, provider.client_config())
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run the full protocol and return a client bound to the selected gateway.
    pub async fn connect(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<LocationClient<C::Transport>, GeoClientError> {
        let catalog = self.fetch_catalog().await?;
        let gateway = self.select(&catalog, lat, lng)?;
        let endpoint = gateway.broker_info;
        let uri = endpoint.uri(&self.config.discovery.scheme);

        trace!(%uri, region = %gateway.topic, "Connecting gateway broker");
        let transport = self.connector.connect(&endpoint).await.map_err(|source| {
            debug!(%uri, error = %source, "Gateway broker connection failed");
            GeoClientError::TransportConnect {
                role: BrokerRole::Gateway,
                uri: uri.clone(),
                source,
            }
        })?;

        info!(%uri, region = %gateway.topic, "Connected to gateway broker");
        LocationClient::new(transport, Arc::clone(&self.geometry), self.config.clone())
    }

    /// Fetch the gateway catalog from the manager broker.
    ///
    /// Malformed catalog messages are logged and skipped; the first one that
    /// parses wins. The catalog may be empty.
    pub async fn fetch_catalog(&self) -> Result<Vec<GatewayRecord>, GeoClientError> {
        let manager = &self.config.manager;
        let uri = manager.uri(&self.config.discovery.scheme);

        trace!(%uri, "Connecting manager broker");
        let transport = self.connector.connect(manager).await.map_err(|source| {
            debug!(%uri, error = %source, "Manager broker connection failed");
            GeoClientError::TransportConnect {
                role: BrokerRole::Manager,
                uri: uri.clone(),
                source,
            }
        })?;

        let result = self.await_catalog(&transport).await;
        transport.disconnect(MANAGER_QUIESCE).await;
        result
    }

    async fn await_catalog(
        &self,
        transport: &C::Transport,
    ) -> Result<Vec<GatewayRecord>, GeoClientError> {
        let discovery = &self.config.discovery;
        let wait = discovery.catalog_timeout();
        let deadline = Instant::now() + wait;

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let handler: DeliveryHandler = Arc::new(move |message: InboundMessage| {
            // Receiver is gone once the wait has ended; late catalogs are dropped.
            let _ = tx.send(message.payload);
        });

        transport
            .subscribe(&discovery.catalog_topic, discovery.catalog_qos, handler)
            .await
            .map_err(|source| {
                GeoClientError::operation(
                    TransportOperation::Subscribe,
                    discovery.catalog_topic.as_str(),
                    source,
                )
            })?;

        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some(payload)) => match parse_catalog(&payload) {
                    Ok(records) => {
                        trace!(gateways = records.len(), "Received gateway catalog");
                        return Ok(records);
                    }
                    Err(error) => {
                        warn!(
                            %error,
                            data = %String::from_utf8_lossy(&payload),
                            "Malformed gateway catalog, waiting for another"
                        );
                    }
                },
                Ok(None) | Err(_) => {
                    debug!(timeout = ?wait, "Gateway catalog not received");
                    return Err(GeoClientError::Timeout(wait));
                }
            }
        }
    }

    /// Choose the gateway whose region contains `(lat, lng)`.
    pub fn select(
        &self,
        catalog: &[GatewayRecord],
        lat: f64,
        lng: f64,
    ) -> Result<GatewayRecord, GeoClientError> {
        if catalog.is_empty() {
            debug!("Gateway catalog is empty");
            return Err(GeoClientError::GatewayInfo);
        }

        let current_topic = cell_to_topic(self.geometry.cell_at(lat, lng));
        select_gateway(catalog, &current_topic, |n| self.random.random_usize(n))
            .cloned()
            .ok_or_else(|| {
                debug!(topic = %current_topic, "No gateway region contains position");
                GeoClientError::NoGatewayMatch {
                    topic: current_topic.clone(),
                }
            })
    }
}
