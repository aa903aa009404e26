//! Test utilities for the geo client.
//!
//! Deterministic stand-ins for the driven ports. Enable with the
//! `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use geo_client::test_utils::RecordingTransport;
//! use geo_client::{BrokerTransport, QoS};
//!
//! let transport = RecordingTransport::new();
//! transport.publish("/forward/1/2", QoS::AtMostOnce, false, b"{}".to_vec()).await?;
//! assert_eq!(transport.published_topics(), vec!["/forward/1/2".to_owned()]);
//! ```

use crate::domain::{
    BrokerEndpoint, CellId, InboundMessage, QoS, TransportError, TransportOperation,
};
use crate::ports::{BrokerTransport, CellGeometry, DeliveryHandler, TransportConnector};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// One call observed by a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `subscribe(filter, qos, _)`
    Subscribe {
        /// Filter
        filter: String,
        /// Requested QoS
        qos: QoS,
    },
    /// `unsubscribe(filter)`
    Unsubscribe {
        /// Filter
        filter: String,
    },
    /// `publish(topic, qos, retained, payload)`
    Publish {
        /// Topic
        topic: String,
        /// QoS
        qos: QoS,
        /// Retain flag
        retained: bool,
        /// Payload
        payload: Vec<u8>,
    },
    /// `disconnect(quiesce)`
    Disconnect,
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<TransportCall>,
    handlers: HashMap<String, DeliveryHandler>,
    replies: HashMap<String, Vec<Vec<u8>>>,
    failures: Vec<(TransportOperation, String, TransportError)>,
    publish_delay: Option<Duration>,
}

/// In-memory transport that records every call.
///
/// Clones share state, so a test can keep a handle while the client owns
/// another.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to the handler immediately whenever `filter` is
    /// subscribed, like a retained message.
    pub fn reply_on_subscribe(&self, filter: &str, payload: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .replies
            .entry(filter.to_owned())
            .or_default()
            .push(payload.into());
    }

    /// Fail the next `operation` on `topic` with `error`.
    pub fn fail_next(&self, operation: TransportOperation, topic: &str, error: TransportError) {
        self.state
            .lock()
            .failures
            .push((operation, topic.to_owned(), error));
    }

    /// Make every publish wait `delay` before it is recorded as sent, like a
    /// full request queue.
    pub fn set_publish_delay(&self, delay: Duration) {
        self.state.lock().publish_delay = Some(delay);
    }

    /// Invoke the handler registered for `filter`.
    ///
    /// Returns false when nothing is subscribed to it.
    pub fn deliver(&self, filter: &str, topic: &str, payload: impl Into<Vec<u8>>) -> bool {
        let handler = self.state.lock().handlers.get(filter).cloned();
        match handler {
            Some(handler) => {
                handler(InboundMessage {
                    topic: topic.to_owned(),
                    payload: payload.into(),
                    qos: QoS::AtMostOnce,
                    retained: false,
                });
                true
            }
            None => false,
        }
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().calls.clone()
    }

    /// Forget recorded calls (handlers stay).
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Filters that currently have a handler.
    pub fn active_filters(&self) -> HashSet<String> {
        self.state.lock().handlers.keys().cloned().collect()
    }

    /// Topics of recorded publishes, in order.
    pub fn published_topics(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Publish { topic, .. } => Some(topic),
                _ => None,
            })
            .collect()
    }

    /// Whether `disconnect` has been called.
    pub fn is_disconnected(&self) -> bool {
        self.calls().contains(&TransportCall::Disconnect)
    }

    fn take_failure(
        &self,
        operation: TransportOperation,
        topic: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let position = state
            .failures
            .iter()
            .position(|(op, t, _)| *op == operation && t == topic);
        match position {
            Some(index) => Err(state.failures.remove(index).2),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BrokerTransport for RecordingTransport {
    async fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        handler: DeliveryHandler,
    ) -> Result<(), TransportError> {
        self.take_failure(TransportOperation::Subscribe, filter)?;
        let replies = {
            let mut state = self.state.lock();
            state.calls.push(TransportCall::Subscribe {
                filter: filter.to_owned(),
                qos,
            });
            state
                .handlers
                .insert(filter.to_owned(), Arc::clone(&handler));
            state.replies.get(filter).cloned().unwrap_or_default()
        };
        for payload in replies {
            handler(InboundMessage {
                topic: filter.to_owned(),
                payload,
                qos,
                retained: true,
            });
        }
        Ok(())
    }

    async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
        self.take_failure(TransportOperation::Unsubscribe, filter)?;
        let mut state = self.state.lock();
        state.calls.push(TransportCall::Unsubscribe {
            filter: filter.to_owned(),
        });
        state.handlers.remove(filter);
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retained: bool,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.take_failure(TransportOperation::Publish, topic)?;
        let delay = self.state.lock().publish_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.lock().calls.push(TransportCall::Publish {
            topic: topic.to_owned(),
            qos,
            retained,
            payload,
        });
        Ok(())
    }

    async fn disconnect(&self, _quiesce: Duration) {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::Disconnect);
        state.handlers.clear();
    }
}

/// Connector handing out [`RecordingTransport`]s, one per endpoint.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    transports: Arc<Mutex<HashMap<BrokerEndpoint, RecordingTransport>>>,
    refused: Arc<Mutex<HashSet<BrokerEndpoint>>>,
    connections: Arc<Mutex<Vec<BrokerEndpoint>>>,
}

impl RecordingConnector {
    /// Create a connector that accepts every endpoint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that `connect(endpoint)` will return, created on first use.
    pub fn transport_for(&self, endpoint: &BrokerEndpoint) -> RecordingTransport {
        self.transports
            .lock()
            .entry(endpoint.clone())
            .or_default()
            .clone()
    }

    /// Refuse connections to `endpoint`.
    pub fn refuse(&self, endpoint: &BrokerEndpoint) {
        self.refused.lock().insert(endpoint.clone());
    }

    /// Endpoints connected to so far, in order.
    pub fn connections(&self) -> Vec<BrokerEndpoint> {
        self.connections.lock().clone()
    }
}

#[async_trait]
impl TransportConnector for RecordingConnector {
    type Transport = RecordingTransport;

    async fn connect(&self, endpoint: &BrokerEndpoint) -> Result<RecordingTransport, TransportError> {
        if self.refused.lock().contains(endpoint) {
            return Err(TransportError::ConnectionRefused(endpoint.to_string()));
        }
        self.connections.lock().push(endpoint.clone());
        Ok(self.transport_for(endpoint))
    }
}

/// Arguments of the last `cover` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverRequest {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
    /// Radius
    pub radius_km: f64,
    /// Finest level
    pub max_level: u8,
    /// Cell budget
    pub max_cells: usize,
}

/// Geometry with a settable exact cell and covering.
#[derive(Default)]
pub struct FixedGeometry {
    cell: Mutex<CellId>,
    covering: Mutex<Vec<CellId>>,
    last_request: Mutex<Option<CoverRequest>>,
}

impl FixedGeometry {
    /// Geometry answering `cell` and `covering` for every position.
    pub fn new(cell: CellId, covering: Vec<CellId>) -> Self {
        Self {
            cell: Mutex::new(cell),
            covering: Mutex::new(covering),
            last_request: Mutex::new(None),
        }
    }

    /// Change the exact cell.
    pub fn set_cell(&self, cell: CellId) {
        *self.cell.lock() = cell;
    }

    /// Change the covering.
    pub fn set_covering(&self, covering: Vec<CellId>) {
        *self.covering.lock() = covering;
    }

    /// Arguments of the most recent `cover` call.
    pub fn last_request(&self) -> Option<CoverRequest> {
        *self.last_request.lock()
    }
}

impl CellGeometry for FixedGeometry {
    fn cell_at(&self, _lat: f64, _lng: f64) -> CellId {
        *self.cell.lock()
    }

    fn cover(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        max_level: u8,
        max_cells: usize,
    ) -> Vec<CellId> {
        *self.last_request.lock() = Some(CoverRequest {
            lat,
            lng,
            radius_km,
            max_level,
            max_cells,
        });
        self.covering.lock().clone()
    }
}

/// Cell from a face and digit list; panics on out-of-range input.
pub fn cell(face: u8, digits: &[u8]) -> CellId {
    match CellId::from_face_digits(face, digits) {
        Some(cell) => cell,
        None => panic!("invalid cell {face}/{digits:?}"),
    }
}
