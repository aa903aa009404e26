//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports.
//!
//! | Port | Adapter | Feature |
//! |------|---------|---------|
//! | `TransportConnector` | `BusConnector` (in-process `geo-bus`) | `bus` |
//! | `TransportConnector` | `MqttConnector` (rumqttc) | `mqtt` |
//! | `CellGeometry` | `S2Geometry` | `s2` |
//! | `RandomSource` | `FixedRandomSource`, `SeededRandomSource` | always |
//! | `ConfigProvider` | `StaticConfigProvider`, `TomlConfigProvider` | always |

pub mod config;
pub mod random;

#[cfg(feature = "bus")]
pub mod bus;

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "s2")]
pub mod s2;

pub use config::{StaticConfigProvider, TomlConfigProvider};
pub use random::{FixedRandomSource, SeededRandomSource};

#[cfg(feature = "bus")]
pub use bus::{BusConnector, BusTransport};

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConnector, MqttTransport};

#[cfg(feature = "s2")]
pub use self::s2::{S2Geometry, EARTH_RADIUS_KM};
