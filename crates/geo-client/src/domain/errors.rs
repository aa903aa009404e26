//! Domain errors for the geo client.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A topic path that cannot be decoded into a cell.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicNameError {
    /// No digits at all.
    #[error("Invalid topic name (empty): {topic:?}")]
    Empty {
        /// Offending input
        topic: String,
    },

    /// Root digit outside 0-5.
    #[error("Invalid topic name {topic:?}: root digit {digit:?} is not in 0-5")]
    InvalidRootDigit {
        /// Offending input
        topic: String,
        /// Offending character
        digit: char,
    },

    /// Level digit outside 0-3.
    #[error("Invalid topic name {topic:?}: digit {digit:?} at level {level} is not in 0-3")]
    InvalidDigit {
        /// Offending input
        topic: String,
        /// 1-based subdivision level of the bad digit
        level: usize,
        /// Offending character
        digit: char,
    },

    /// More levels than the hierarchy has.
    #[error("Invalid topic name {topic:?}: {depth} levels exceed the maximum of 30")]
    TooDeep {
        /// Offending input
        topic: String,
        /// Number of level digits found
        depth: usize,
    },
}

/// Failure reported by a broker transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Nothing is listening at the endpoint, or the broker refused us.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// The connection is gone.
    #[error("not connected")]
    Disconnected,

    /// The broker (or the client library) rejected the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The request did not complete in time.
    #[error("transport operation timed out")]
    Timeout,
}

/// Which broker a connection attempt targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerRole {
    /// Well-known broker serving the gateway catalog
    Manager,
    /// Regional broker selected from the catalog
    Gateway,
}

impl fmt::Display for BrokerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manager => write!(f, "manager"),
            Self::Gateway => write!(f, "gateway"),
        }
    }
}

/// Transport operation that failed during synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOperation {
    /// Subscribe request
    Subscribe,
    /// Unsubscribe request
    Unsubscribe,
    /// Publish request
    Publish,
}

impl fmt::Display for TransportOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribe => write!(f, "subscribe"),
            Self::Unsubscribe => write!(f, "unsubscribe"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// Configuration loading or validation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Failed to read {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// TOML could not be parsed.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted field path
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Errors surfaced by the location client and gateway discovery.
#[derive(Debug, Error)]
pub enum GeoClientError {
    /// Manager or gateway connection failed. Fatal, no built-in retry.
    #[error("failed to connect to {role} broker at {uri}: {source}")]
    TransportConnect {
        /// Which broker
        role: BrokerRole,
        /// Connection URI that was tried
        uri: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// No valid catalog arrived before the deadline.
    #[error("gateway catalog not received within {0:?}")]
    Timeout(Duration),

    /// The catalog parsed but lists no gateways.
    #[error("gateway catalog is empty")]
    GatewayInfo,

    /// No gateway region contains the current position.
    #[error("no gateway region contains {topic}")]
    NoGatewayMatch {
        /// Topic of the current position
        topic: String,
    },

    /// Malformed topic passed to the codec.
    #[error(transparent)]
    InvalidTopicName(#[from] TopicNameError),

    /// Subscribe, unsubscribe or publish failed; earlier operations of the
    /// same call may already have been applied.
    #[error("{operation} failed for topic {topic}: {source}")]
    SubscriptionOperation {
        /// Failed operation
        operation: TransportOperation,
        /// Topic involved
        topic: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GeoClientError {
    /// Build a `SubscriptionOperation` error.
    pub fn operation(
        operation: TransportOperation,
        topic: impl Into<String>,
        source: TransportError,
    ) -> Self {
        Self::SubscriptionOperation {
            operation,
            topic: topic.into(),
            source,
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::SubscriptionOperation { .. } | Self::TransportConnect { .. }
        )
    }
}
