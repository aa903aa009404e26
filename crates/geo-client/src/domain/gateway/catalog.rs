use serde::{Deserialize, Serialize};
use std::fmt;

/// Network address of a broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrokerEndpoint {
    /// Hostname or IP literal
    pub host: String,
    /// TCP port
    pub port: u16,
}

/// Catalog spelling of a broker address.
pub type BrokerInfo = BrokerEndpoint;

impl BrokerEndpoint {
    /// Create an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Connection URI, `scheme://host:port`.
    pub fn uri(&self, scheme: &str) -> String {
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// The conventional local manager, `localhost:1883`.
impl Default for BrokerEndpoint {
    fn default() -> Self {
        Self::new("localhost", 1883)
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One catalog entry: a region prefix and the broker serving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRecord {
    /// Region topic prefix, no wildcard
    pub topic: String,
    /// Gateway broker address
    pub broker_info: BrokerInfo,
}

impl GatewayRecord {
    /// Create a record.
    pub fn new(topic: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            topic: topic.into(),
            broker_info: BrokerInfo::new(host, port),
        }
    }

    /// Whether this region contains `topic`.
    pub fn covers(&self, topic: &str) -> bool {
        topic.starts_with(&self.topic)
    }
}

/// Parse a catalog payload.
pub fn parse_catalog(payload: &[u8]) -> Result<Vec<GatewayRecord>, serde_json::Error> {
    serde_json::from_slice(payload)
}
