//! # Message Publisher
//!
//! Defines the publishing side of the broker.

use crate::message::BusMessage;
use crate::subscriber::Subscription;
use crate::topic::{validate_topic_name, TopicFilter, TopicFilterError};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing messages to a broker.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a message.
    ///
    /// # Returns
    ///
    /// The number of live subscriptions the message was broadcast to.
    async fn publish(&self, message: BusMessage) -> Result<usize, TopicFilterError>;

    /// Get the total number of messages published.
    fn messages_published(&self) -> u64;
}

/// In-memory broker.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer fan-out;
/// each subscription filters the shared stream by its own topic filter.
pub struct InMemoryBroker {
    /// Broadcast sender for messages.
    sender: broadcast::Sender<BusMessage>,

    /// Retained message per concrete topic.
    retained: RwLock<HashMap<String, BusMessage>>,

    /// Active subscription count by filter.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryBroker {
    /// Create a new broker with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new broker with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            retained: RwLock::new(HashMap::new()),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to messages matching a filter.
    ///
    /// Retained messages matching the filter are queued ahead of live traffic.
    pub fn subscribe(&self, filter: &str) -> Result<Subscription, TopicFilterError> {
        let filter = TopicFilter::parse(filter)?;

        // Attach the receiver before snapshotting retained messages so nothing
        // published in between is missed.
        let receiver = self.sender.subscribe();

        let pending: VecDeque<BusMessage> = match self.retained.read() {
            Ok(retained) => retained
                .values()
                .filter(|m| filter.matches(&m.topic))
                .cloned()
                .collect(),
            Err(_) => VecDeque::new(),
        };

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(filter.as_str().to_owned()).or_insert(0) += 1;
        }

        debug!(filter = %filter, retained = pending.len(), "New subscription created");

        Ok(Subscription::new(
            receiver,
            filter,
            pending,
            self.subscriptions.clone(),
        ))
    }

    /// Number of live subscriptions using exactly this filter string.
    #[must_use]
    pub fn subscription_count(&self, filter: &str) -> usize {
        self.subscriptions
            .read()
            .ok()
            .and_then(|subs| subs.get(filter).copied())
            .unwrap_or(0)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Number of topics holding a retained message.
    #[must_use]
    pub fn retained_count(&self) -> usize {
        self.retained.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn store_retained(&self, message: &BusMessage) {
        let Ok(mut retained) = self.retained.write() else {
            return;
        };
        if message.payload.is_empty() {
            retained.remove(&message.topic);
            trace!(topic = %message.topic, "Retained message cleared");
        } else {
            retained.insert(message.topic.clone(), message.clone());
            trace!(topic = %message.topic, "Retained message stored");
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBroker {
    async fn publish(&self, message: BusMessage) -> Result<usize, TopicFilterError> {
        validate_topic_name(&message.topic)?;

        // Always increment counter (publish was attempted)
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        if message.retained {
            self.store_retained(&message);
        }

        let topic = message.topic.clone();
        match self.sender.send(message) {
            Ok(receivers) => {
                debug!(topic = %topic, receivers, "Message published");
                Ok(receivers)
            }
            Err(_) => {
                // No receivers - live delivery is dropped, retained copy survives
                trace!(topic = %topic, "Message dropped (no receivers)");
                Ok(0)
            }
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
