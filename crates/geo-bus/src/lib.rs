//! # Geo Bus - In-Memory Topic Broker
//!
//! A process-local broker with MQTT 3.1.1 topic semantics. It stands in for
//! the manager and gateway brokers when the client runs without a network
//! (tests, demos, trajectory replays).
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Publisher   │                    │  Subscriber  │
//! │              │    publish()       │  "/1/2/#"    │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │ InMemoryBroker│ ────────┘
//!                  │  (retained)  │  subscribe()
//!                  └──────────────┘
//! ```
//!
//! ## Semantics
//!
//! - `+` matches exactly one topic level, `#` matches the rest (parent included)
//! - Retained messages are replayed to new matching subscriptions
//! - A retained publish with an empty payload clears the retained slot

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod message;
pub mod publisher;
pub mod registry;
pub mod subscriber;
pub mod topic;

// Re-export main types
pub use message::BusMessage;
pub use publisher::{InMemoryBroker, MessagePublisher};
pub use registry::BrokerRegistry;
pub use subscriber::Subscription;
pub use topic::{validate_topic_name, TopicFilter, TopicFilterError};

/// Maximum messages to buffer per subscriber before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Topic level separator.
pub const LEVEL_SEPARATOR: char = '/';
