//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** the location API applications call
//! - **Driven Ports (Outbound):** transport, geometry and randomness the
//!   client requires from adapters

pub mod inbound;
pub mod outbound;

pub use inbound::LocationApi;
pub use outbound::{
    BrokerTransport, CellGeometry, ConfigProvider, DeliveryHandler, RandomSource,
    TransportConnector,
};
