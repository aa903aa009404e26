//! Domain Layer - Pure addressing and synchronization logic with no I/O
//!
//! - Hierarchical cell identifiers
//! - Cell-address codec (cell ⇄ topic path ⇄ token)
//! - Subscription diff engine
//! - Gateway catalog parsing and prefix selection
//! - Configuration and errors

pub mod cell;
pub mod codec;
pub mod config;
pub mod diff;
pub mod errors;
pub mod gateway;
pub mod types;

pub use cell::{CellId, MAX_LEVEL, NUM_FACES};
pub use codec::{
    cell_to_topic, parse_topic_digits, topic_to_cell, topic_to_token, wildcard_topic, SEPARATOR,
    WILDCARD_SUFFIX,
};
pub use config::{ClientConfig, DiscoveryConfig, PublishConfig, SubscriptionConfig};
pub use diff::{diff_subscriptions, SubscriptionDiff, TOMBSTONE};
pub use errors::{
    BrokerRole, ConfigError, GeoClientError, TopicNameError, TransportError, TransportOperation,
};
pub use gateway::{
    matching_records, parse_catalog, select_gateway, BrokerEndpoint, BrokerInfo, GatewayRecord,
};
pub use types::{InboundMessage, InvalidQoS, QoS};
