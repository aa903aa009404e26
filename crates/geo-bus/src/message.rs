//! # Bus Messages
//!
//! The unit that flows through the in-memory broker.

use serde::{Deserialize, Serialize};

/// A published message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Concrete topic the message was published to (never a filter).
    pub topic: String,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Requested quality of service (0, 1 or 2). Informational only;
    /// in-memory delivery is always exactly once per live subscription.
    pub qos: u8,
    /// Whether the broker keeps this as the topic's retained message.
    pub retained: bool,
}

impl BusMessage {
    /// Create a non-retained QoS 0 message.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: 0,
            retained: false,
        }
    }

    /// Set the quality of service.
    #[must_use]
    pub fn with_qos(mut self, qos: u8) -> Self {
        self.qos = qos;
        self
    }

    /// Mark the message as retained.
    #[must_use]
    pub fn retained(mut self) -> Self {
        self.retained = true;
        self
    }

    /// Payload interpreted as UTF-8, lossy.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
