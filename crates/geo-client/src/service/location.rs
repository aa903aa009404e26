use crate::domain::{
    cell_to_topic, diff_subscriptions, wildcard_topic, ClientConfig, GeoClientError, QoS,
    TransportError, TransportOperation, TOMBSTONE,
};
use crate::ports::{BrokerTransport, CellGeometry, DeliveryHandler, LocationApi};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Location-driven client bound to one broker.
///
/// Tracks the wildcard filters it has subscribed and keeps them in line
/// with the covering of the caller's position.
///
/// # Example
///
/// ```rust,ignore
/// let mut client = LocationClient::new(transport, geometry, ClientConfig::default())?;
/// client.update_subscribe(35.68, 139.76, QoS::AtMostOnce, handler).await?;
/// client.publish(35.68, 139.76, QoS::AtMostOnce, false, payload).await?;
/// client.unsubscribe().await?;
/// client.disconnect(Duration::from_millis(250)).await;
/// ```
pub struct LocationClient<T: BrokerTransport + 'static> {
    transport: Arc<T>,
    geometry: Arc<dyn CellGeometry>,
    config: ClientConfig,
    subscriptions: Vec<String>,
}

impl<T: BrokerTransport + 'static> LocationClient<T> {
    /// Wrap an already connected transport (discovery bypassed).
    ///
    /// # Errors
    ///
    /// Returns `GeoClientError::Config` when `config` fails validation.
    pub fn new(
        transport: T,
        geometry: Arc<dyn CellGeometry>,
        config: ClientConfig,
    ) -> Result<Self, GeoClientError> {
        config.validate()?;
        Ok(Self {
            transport: Arc::new(transport),
            geometry,
            config,
            subscriptions: Vec::new(),
        })
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Exact-cell topic for a position, without the publish prefix.
    pub fn current_topic(&self, lat: f64, lng: f64) -> String {
        cell_to_topic(self.geometry.cell_at(lat, lng))
    }

    /// Wildcard filters covering the interest disc around a position.
    pub fn desired_topics(&self, lat: f64, lng: f64) -> Vec<String> {
        let settings = &self.config.subscription;
        self.geometry
            .cover(
                lat,
                lng,
                settings.radius_km,
                settings.max_level,
                settings.max_cells,
            )
            .into_iter()
            .map(wildcard_topic)
            .collect()
    }

    /// Close the transport.
    pub async fn disconnect(self, quiesce: Duration) {
        debug!(tracked = self.subscriptions.len(), "Disconnecting");
        self.transport.disconnect(quiesce).await;
    }

    async fn add_subscription(
        &mut self,
        topic: &str,
        qos: QoS,
        handler: DeliveryHandler,
    ) -> Result<(), GeoClientError> {
        self.transport
            .subscribe(topic, qos, handler)
            .await
            .map_err(|e| GeoClientError::operation(TransportOperation::Subscribe, topic, e))?;
        if let Err(error) = self
            .announce(&self.config.subscription.register_topic, topic)
            .await
        {
            // An unregistered filter must not stay live on the transport.
            match self.transport.unsubscribe(topic).await {
                Ok(()) => trace!(topic, "Subscription rolled back after failed register"),
                Err(rollback) => {
                    warn!(topic, error = %rollback, "Rollback failed, filter stays tracked");
                    self.subscriptions.push(topic.to_owned());
                }
            }
            return Err(error);
        }
        self.subscriptions.push(topic.to_owned());
        trace!(topic, "Subscribed");
        Ok(())
    }

    async fn remove_subscription(&mut self, topic: &str) -> Result<(), GeoClientError> {
        self.transport
            .unsubscribe(topic)
            .await
            .map_err(|e| GeoClientError::operation(TransportOperation::Unsubscribe, topic, e))?;
        self.announce(&self.config.subscription.unregister_topic, topic)
            .await?;
        if let Some(index) = self.subscriptions.iter().position(|t| t == topic) {
            self.subscriptions.remove(index);
        }
        trace!(topic, "Unsubscribed");
        Ok(())
    }

    /// Control-plane notification carrying the filter as payload.
    async fn announce(&self, control_topic: &str, topic: &str) -> Result<(), GeoClientError> {
        self.transport
            .publish(
                control_topic,
                QoS::AtMostOnce,
                false,
                topic.as_bytes().to_vec(),
            )
            .await
            .map_err(|e| GeoClientError::operation(TransportOperation::Publish, control_topic, e))
    }
}

#[async_trait]
impl<T: BrokerTransport + 'static> LocationApi for LocationClient<T> {
    async fn update_subscribe(
        &mut self,
        lat: f64,
        lng: f64,
        qos: QoS,
        handler: DeliveryHandler,
    ) -> Result<(), GeoClientError> {
        let desired = self.desired_topics(lat, lng);
        let diff = diff_subscriptions(&self.subscriptions, &desired);
        debug!(
            lat,
            lng,
            subscribe = diff.subscribes().count(),
            unsubscribe = diff.unsubscribes().count(),
            "Updating subscriptions"
        );

        // New filters go live before old ones are dropped.
        for topic in diff.subscribes() {
            self.add_subscription(topic, qos, Arc::clone(&handler)).await?;
        }
        for topic in diff.unsubscribes() {
            self.remove_subscription(topic).await?;
        }

        self.subscriptions = desired;
        Ok(())
    }

    async fn publish(
        &self,
        lat: f64,
        lng: f64,
        qos: QoS,
        retained: bool,
        payload: Vec<u8>,
    ) -> Result<(), GeoClientError> {
        let topic = format!(
            "{}{}",
            self.config.publish.topic_prefix,
            self.current_topic(lat, lng)
        );
        let wait = self.config.publish.ack_timeout();

        // The send runs on its own task so an expired wait leaves it in flight.
        let transport = Arc::clone(&self.transport);
        let send_topic = topic.clone();
        let send = tokio::spawn(async move {
            transport
                .publish(&send_topic, qos, retained, payload)
                .await
        });

        match tokio::time::timeout(wait, send).await {
            Ok(Ok(result)) => result.map_err(|e| {
                GeoClientError::operation(TransportOperation::Publish, topic.as_str(), e)
            }),
            Ok(Err(join)) => Err(GeoClientError::operation(
                TransportOperation::Publish,
                topic.as_str(),
                TransportError::Rejected(join.to_string()),
            )),
            Err(_) => {
                trace!(%topic, ?wait, "Publish acknowledgement still pending");
                Ok(())
            }
        }
    }

    async fn unsubscribe(&mut self) -> Result<(), GeoClientError> {
        let tracked: Vec<String> = self
            .subscriptions
            .iter()
            .filter(|t| t.as_str() != TOMBSTONE)
            .cloned()
            .collect();
        for topic in &tracked {
            self.remove_subscription(topic).await?;
        }
        Ok(())
    }

    fn subscriptions(&self) -> Vec<String> {
        self.subscriptions
            .iter()
            .filter(|t| t.as_str() != TOMBSTONE)
            .cloned()
            .collect()
    }
}
