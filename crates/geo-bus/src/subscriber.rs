//! # Subscriptions
//!
//! Defines the receiving side of the broker.

use crate::message::BusMessage;
use crate::topic::TopicFilter;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

/// A subscription handle for receiving messages.
///
/// Yields retained messages captured at subscribe time first, then live
/// messages matching the filter. When dropped, the subscription is
/// automatically cleaned up.
pub struct Subscription {
    /// Live message stream.
    inner: BroadcastStream<BusMessage>,

    /// Filter for this subscription.
    filter: TopicFilter,

    /// Retained messages not yet handed out.
    pending: VecDeque<BusMessage>,

    /// Reference to subscription tracking (for cleanup).
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<BusMessage>,
        filter: TopicFilter,
        pending: VecDeque<BusMessage>,
        subscriptions: Arc<RwLock<HashMap<String, usize>>>,
    ) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
            pending,
            subscriptions,
        }
    }

    /// Receive the next message that matches the filter.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next matching message
    /// - `None` - The broker was dropped
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.next().await
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }
}

impl Stream for Subscription {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(message) = self.pending.pop_front() {
            return Poll::Ready(Some(message));
        }

        loop {
            let polled = Pin::new(&mut self.inner).poll_next(cx);
            match polled {
                Poll::Ready(Some(Ok(message))) => {
                    if self.filter.matches(&message.topic) {
                        return Poll::Ready(Some(message));
                    }
                    // Message doesn't match filter, keep polling
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(filter = %self.filter, lagged = count, "Subscriber lagged, some messages dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let key = self.filter.as_str();
        let Ok(mut subs) = self.subscriptions.write() else {
            return;
        };
        let Some(count) = subs.get_mut(key) else {
            debug!(filter = %key, "Subscription dropped");
            return;
        };

        *count = count.saturating_sub(1);
        if *count == 0 {
            subs.remove(key);
        }
        debug!(filter = %key, "Subscription dropped");
    }
}
