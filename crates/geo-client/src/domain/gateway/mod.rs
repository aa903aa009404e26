//! # Gateway Catalog & Selection
//!
//! The manager broker publishes a JSON catalog of regional gateways, each
//! responsible for the cells below a topic prefix:
//!
//! ```json
//! [{"topic": "/1/2", "broker_info": {"host": "gw-a", "port": 1884}}]
//! ```
//!
//! Selection keeps the records whose prefix contains the client's current
//! topic, prefers the longest prefix, and breaks ties at random.

mod catalog;
mod selection;

pub use catalog::{parse_catalog, BrokerEndpoint, BrokerInfo, GatewayRecord};
pub use selection::{matching_records, select_gateway};
