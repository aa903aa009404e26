//! # Geo Client
//!
//! Location-aware publish/subscribe over hierarchical cell topics.
//!
//! A position maps to a leaf cell of a hierarchical partition of the sphere;
//! a cell maps to a topic path (`/face/d1/d2/...`). A client discovers the
//! gateway broker whose region contains it, keeps a small set of
//! cell-prefix subscriptions covering a disc around its position, and
//! publishes to its exact leaf topic.
//!
//! ## Architecture
//!
//! - **Domain Layer:** cell ids, topic codec, subscription diff, catalog selection
//! - **Ports Layer:** transport, connector, geometry, randomness, config
//! - **Service Layer:** `GatewayDiscovery` and `LocationClient`
//! - **Adapters Layer:** `geo-bus`, rumqttc and s2 implementations (feature-gated)
//!
//! ## Features
//!
//! - `bus` - in-process broker transport (default)
//! - `s2` - S2 cell geometry (default)
//! - `mqtt` - rumqttc transport
//! - `test-utils` - recording transport and fixed geometry
//!
//! ## Example
//!
//! ```rust
//! use geo_client::{cell_to_topic, diff_subscriptions, topic_to_token, CellId};
//!
//! let cell = CellId::from_face_digits(1, &[3, 0, 2]).unwrap();
//! assert_eq!(cell_to_topic(cell), "/1/3/0/2");
//! assert_eq!(topic_to_token("/1/3/0/2").unwrap(), cell.to_token());
//!
//! let current = vec!["/1/3/#".to_owned(), "/1/2/#".to_owned()];
//! let desired = vec!["/1/3/#".to_owned(), "/1/0/#".to_owned()];
//! let diff = diff_subscriptions(&current, &desired);
//! assert_eq!(diff.subscribes().collect::<Vec<_>>(), vec!["/1/0/#"]);
//! assert_eq!(diff.unsubscribes().collect::<Vec<_>>(), vec!["/1/2/#"]);
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// ADAPTERS (individual adapters are feature-gated)
// =============================================================================

pub mod adapters;

/// Test utilities (RecordingTransport, FixedGeometry, etc.)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// CORE RE-EXPORTS
// =============================================================================

// Domain entities
pub use domain::{
    BrokerEndpoint, BrokerInfo, CellId, ClientConfig, DiscoveryConfig, GatewayRecord,
    InboundMessage, PublishConfig, QoS, SubscriptionConfig, SubscriptionDiff, MAX_LEVEL,
    NUM_FACES,
};

// Domain functions
pub use domain::{
    cell_to_topic, diff_subscriptions, parse_catalog, select_gateway, topic_to_cell,
    topic_to_token, wildcard_topic,
};

// Errors
pub use domain::{
    BrokerRole, ConfigError, GeoClientError, TopicNameError, TransportError, TransportOperation,
};

// Port traits
pub use ports::{
    BrokerTransport, CellGeometry, ConfigProvider, DeliveryHandler, LocationApi, RandomSource,
    TransportConnector,
};

// Services
pub use service::{GatewayDiscovery, LocationClient, MANAGER_QUIESCE};

// Adapters
pub use adapters::{FixedRandomSource, SeededRandomSource, TomlConfigProvider};

#[cfg(feature = "bus")]
pub use adapters::{BusConnector, BusTransport};

#[cfg(feature = "mqtt")]
pub use adapters::{MqttConnector, MqttTransport};

#[cfg(feature = "s2")]
pub use adapters::S2Geometry;
