//! # Broker Registry
//!
//! Process-local "network" of brokers addressed by `host:port`, so a manager
//! broker and several gateway brokers can run side by side in one process.

use crate::publisher::InMemoryBroker;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of in-memory brokers keyed by address.
#[derive(Default)]
pub struct BrokerRegistry {
    brokers: RwLock<HashMap<String, Arc<InMemoryBroker>>>,
}

impl BrokerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or return the already running) broker at `host:port`.
    pub fn start(&self, host: &str, port: u16) -> Arc<InMemoryBroker> {
        let address = Self::address(host, port);
        let mut brokers = self.brokers.write();
        brokers
            .entry(address.clone())
            .or_insert_with(|| {
                debug!(address = %address, "In-memory broker started");
                Arc::new(InMemoryBroker::new())
            })
            .clone()
    }

    /// Look up a running broker.
    #[must_use]
    pub fn get(&self, host: &str, port: u16) -> Option<Arc<InMemoryBroker>> {
        self.brokers.read().get(&Self::address(host, port)).cloned()
    }

    /// Stop a broker. Existing subscriptions end once the last handle drops.
    pub fn stop(&self, host: &str, port: u16) -> Option<Arc<InMemoryBroker>> {
        let removed = self.brokers.write().remove(&Self::address(host, port));
        if removed.is_some() {
            debug!(host, port, "In-memory broker stopped");
        }
        removed
    }

    /// Number of running brokers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.brokers.read().len()
    }

    /// Whether no broker is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.brokers.read().is_empty()
    }

    fn address(host: &str, port: u16) -> String {
        format!("{host}:{port}")
    }
}
