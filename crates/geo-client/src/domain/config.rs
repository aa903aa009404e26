//! Client configuration.
//!
//! Every section and field has a default, so an empty TOML document is a
//! valid configuration:
//!
//! ```toml
//! [manager]
//! host = "localhost"
//! port = 1883
//!
//! [discovery]
//! catalog_topic = "/api/gateway/info/all"
//! catalog_timeout_ms = 1000
//! catalog_qos = 2
//! scheme = "tcp"
//!
//! [subscription]
//! radius_km = 1.0
//! max_cells = 4
//! max_level = 20
//! register_topic = "/api/register"
//! unregister_topic = "/api/unregister"
//!
//! [publish]
//! topic_prefix = "/forward"
//! ack_timeout_ms = 100
//! ```

use super::cell::MAX_LEVEL;
use super::errors::ConfigError;
use super::gateway::BrokerEndpoint;
use super::types::QoS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Full client configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Manager broker serving the gateway catalog
    pub manager: BrokerEndpoint,
    /// Catalog round-trip
    pub discovery: DiscoveryConfig,
    /// Interest area and control-plane topics
    pub subscription: SubscriptionConfig,
    /// Position publishes
    pub publish: PublishConfig,
}

/// Gateway discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Topic the manager publishes the catalog on
    pub catalog_topic: String,
    /// How long to wait for a valid catalog
    pub catalog_timeout_ms: u64,
    /// QoS of the catalog subscription
    pub catalog_qos: QoS,
    /// URI scheme used for manager and gateway connections
    pub scheme: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            catalog_topic: "/api/gateway/info/all".to_owned(),
            catalog_timeout_ms: 1000,
            catalog_qos: QoS::ExactlyOnce,
            scheme: "tcp".to_owned(),
        }
    }
}

impl DiscoveryConfig {
    /// Catalog deadline as a `Duration`.
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_millis(self.catalog_timeout_ms)
    }
}

/// Subscription (interest area) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Interest radius around the current position
    pub radius_km: f64,
    /// Upper bound on covering cells
    pub max_cells: usize,
    /// Finest covering level
    pub max_level: u8,
    /// Control topic announcing a new subscription
    pub register_topic: String,
    /// Control topic announcing a dropped subscription
    pub unregister_topic: String,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            radius_km: 1.0,
            max_cells: 4,
            max_level: 20,
            register_topic: "/api/register".to_owned(),
            unregister_topic: "/api/unregister".to_owned(),
        }
    }
}

/// Position publish settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Prepended to the exact-cell topic
    pub topic_prefix: String,
    /// Bounded acknowledgement wait
    pub ack_timeout_ms: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            topic_prefix: "/forward".to_owned(),
            ack_timeout_ms: 100,
        }
    }
}

impl PublishConfig {
    /// Acknowledgement wait as a `Duration`.
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

impl ClientConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manager.host.is_empty() {
            return Err(invalid("manager.host", "must not be empty"));
        }
        if self.discovery.catalog_topic.is_empty() {
            return Err(invalid("discovery.catalog_topic", "must not be empty"));
        }
        if self.discovery.scheme.is_empty() {
            return Err(invalid("discovery.scheme", "must not be empty"));
        }
        if self.discovery.catalog_timeout_ms == 0 {
            return Err(invalid("discovery.catalog_timeout_ms", "must be positive"));
        }
        self.subscription.validate()?;
        if self.publish.ack_timeout_ms == 0 {
            return Err(invalid("publish.ack_timeout_ms", "must be positive"));
        }
        Ok(())
    }
}

impl SubscriptionConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(invalid(
                "subscription.radius_km",
                format!("must be a positive number, got {}", self.radius_km),
            ));
        }
        if self.max_cells == 0 {
            return Err(invalid("subscription.max_cells", "must be at least 1"));
        }
        if self.max_level > MAX_LEVEL {
            return Err(invalid(
                "subscription.max_level",
                format!("must be at most {MAX_LEVEL}, got {}", self.max_level),
            ));
        }
        if self.register_topic.is_empty() || self.unregister_topic.is_empty() {
            return Err(invalid(
                "subscription.register_topic",
                "control topics must not be empty",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
