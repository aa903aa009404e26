//! Small value types shared across layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery guarantee requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QoS {
    /// Fire and forget
    #[default]
    AtMostOnce,
    /// Acknowledged delivery, duplicates possible
    AtLeastOnce,
    /// Four-way handshake, no duplicates
    ExactlyOnce,
}

impl QoS {
    /// Numeric level (0, 1 or 2).
    pub fn level(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

impl TryFrom<u8> for QoS {
    type Error = InvalidQoS;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            other => Err(InvalidQoS(other)),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        qos.level()
    }
}

impl fmt::Display for QoS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// QoS level outside 0-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid QoS level {0}, expected 0, 1 or 2")]
pub struct InvalidQoS(pub u8);

/// A message delivered to a subscription handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Concrete topic the message was published on
    pub topic: String,
    /// Raw payload
    pub payload: Vec<u8>,
    /// Delivery QoS
    pub qos: QoS,
    /// Whether the broker replayed it from its retained store
    pub retained: bool,
}

impl InboundMessage {
    /// Payload as UTF-8, lossy.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
