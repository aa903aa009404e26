//! # Subscription Flows
//!
//! A discovered client keeping its covering in sync with the gateway,
//! announcing each change on the control topics, and exchanging position
//! messages with a nearby client through the gateway's forwarder.

#[cfg(test)]
mod tests {
    use super::super::*;
    use geo_bus::{BusMessage, InMemoryBroker, MessagePublisher, Subscription};
    use geo_client::{
        BusTransport, ClientConfig, DeliveryHandler, InboundMessage, LocationApi, LocationClient,
        QoS, S2Geometry,
    };
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    async fn connected() -> (Deployment, Arc<InMemoryBroker>, LocationClient<BusTransport>) {
        let deployment = Deployment::new();
        let gateway = deployment.gateway("gw-fine", 1884);
        deployment
            .publish_catalog(&catalog(&[(FINE_REGION, "gw-fine", 1884)]))
            .await;
        let client = deployment.discovery().connect(1.0, 1.0).await.unwrap();
        (deployment, gateway, client)
    }

    fn capture() -> (DeliveryHandler, mpsc::UnboundedReceiver<InboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: DeliveryHandler = Arc::new(move |m: InboundMessage| {
            let _ = tx.send(m);
        });
        (handler, rx)
    }

    /// Drain whatever `subscription` has buffered right now.
    async fn drain(subscription: &mut Subscription) -> Vec<String> {
        let mut seen = Vec::new();
        while let Ok(Some(message)) =
            timeout(Duration::from_millis(50), subscription.recv()).await
        {
            seen.push(message.payload_str().into_owned());
        }
        seen
    }

    /// Live subscriptions for `filter` once aborted delivery tasks have wound down.
    async fn settled_count(broker: &InMemoryBroker, filter: &str) -> usize {
        for _ in 0..50 {
            if broker.subscription_count(filter) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        broker.subscription_count(filter)
    }

    #[tokio::test]
    async fn test_first_update_subscribes_and_registers_covering() {
        let (_deployment, gateway, mut client) = connected().await;
        let mut registrations = gateway.subscribe("/api/register").unwrap();
        let (handler, _rx) = capture();

        client
            .update_subscribe(1.0, 1.0, QoS::AtMostOnce, handler)
            .await
            .unwrap();

        let tracked = client.subscriptions();
        assert!(!tracked.is_empty() && tracked.len() <= 4);
        assert!(tracked.iter().all(|t| t.ends_with("/#")));
        for filter in &tracked {
            assert_eq!(gateway.subscription_count(filter), 1);
        }

        let registered: HashSet<String> = drain(&mut registrations).await.into_iter().collect();
        assert_eq!(registered, tracked.into_iter().collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn test_repeated_update_is_a_no_op() {
        let (_deployment, gateway, mut client) = connected().await;
        let (handler, _rx) = capture();
        client
            .update_subscribe(1.0, 1.0, QoS::AtMostOnce, Arc::clone(&handler))
            .await
            .unwrap();
        let before = client.subscriptions();

        let mut registrations = gateway.subscribe("/api/register").unwrap();
        let mut unregistrations = gateway.subscribe("/api/unregister").unwrap();
        client
            .update_subscribe(1.0, 1.0, QoS::AtMostOnce, handler)
            .await
            .unwrap();

        assert_eq!(client.subscriptions(), before);
        assert!(drain(&mut registrations).await.is_empty());
        assert!(drain(&mut unregistrations).await.is_empty());
    }

    #[tokio::test]
    async fn test_moving_away_swaps_the_covering() {
        let (_deployment, gateway, mut client) = connected().await;
        let (handler, _rx) = capture();
        client
            .update_subscribe(1.0, 1.0, QoS::AtMostOnce, Arc::clone(&handler))
            .await
            .unwrap();
        let old: HashSet<String> = client.subscriptions().into_iter().collect();

        let mut unregistrations = gateway.subscribe("/api/unregister").unwrap();
        client
            .update_subscribe(-33.87, 151.21, QoS::AtMostOnce, handler)
            .await
            .unwrap();

        let new: HashSet<String> = client.subscriptions().into_iter().collect();
        assert!(old.is_disjoint(&new));
        for filter in &old {
            assert_eq!(settled_count(&gateway, filter).await, 0);
        }
        let unregistered: HashSet<String> =
            drain(&mut unregistrations).await.into_iter().collect();
        assert_eq!(unregistered, old);
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_every_filter() {
        let (_deployment, gateway, mut client) = connected().await;
        let (handler, _rx) = capture();
        client
            .update_subscribe(1.0, 1.0, QoS::AtMostOnce, handler)
            .await
            .unwrap();
        let tracked = client.subscriptions();

        client.unsubscribe().await.unwrap();

        for filter in &tracked {
            assert_eq!(settled_count(&gateway, filter).await, 0);
        }
        assert!(client.subscriptions().is_empty());
        assert!(client.transport().active_filters().is_empty());
    }

    #[tokio::test]
    async fn test_nearby_publish_is_delivered_through_forwarder() {
        let (_deployment, gateway, mut listener) = connected().await;
        let forwarder = spawn_forwarder(Arc::clone(&gateway), "/forward");
        let (handler, mut inbox) = capture();
        listener
            .update_subscribe(1.0, 1.0, QoS::AtMostOnce, handler)
            .await
            .unwrap();

        let sender = LocationClient::new(
            BusTransport::new(Arc::clone(&gateway)),
            Arc::new(S2Geometry::new()),
            ClientConfig::default(),
        )
        .unwrap();
        sender
            .publish(1.0001, 1.0001, QoS::AtLeastOnce, false, b"hello".to_vec())
            .await
            .unwrap();

        let message = timeout(WAIT, inbox.recv()).await.unwrap().unwrap();
        assert_eq!(message.payload_str(), "hello");
        assert_eq!(message.topic, sender.current_topic(1.0001, 1.0001));
        forwarder.abort();
    }

    #[tokio::test]
    async fn test_distant_publish_is_not_delivered() {
        let (_deployment, gateway, mut listener) = connected().await;
        let forwarder = spawn_forwarder(Arc::clone(&gateway), "/forward");
        let (handler, mut inbox) = capture();
        listener
            .update_subscribe(1.0, 1.0, QoS::AtMostOnce, handler)
            .await
            .unwrap();

        let sender = LocationClient::new(
            BusTransport::new(Arc::clone(&gateway)),
            Arc::new(S2Geometry::new()),
            ClientConfig::default(),
        )
        .unwrap();
        sender
            .publish(1.5, 1.5, QoS::AtMostOnce, false, b"far".to_vec())
            .await
            .unwrap();

        assert!(timeout(Duration::from_millis(200), inbox.recv()).await.is_err());
        forwarder.abort();
    }

    #[tokio::test]
    async fn test_disconnected_client_stops_receiving() {
        let (_deployment, gateway, mut listener) = connected().await;
        let (handler, mut inbox) = capture();
        listener
            .update_subscribe(1.0, 1.0, QoS::AtMostOnce, handler)
            .await
            .unwrap();
        let topic = listener.current_topic(1.0, 1.0);

        listener.disconnect(Duration::ZERO).await;

        gateway
            .publish(BusMessage::new(topic, "after"))
            .await
            .unwrap();
        assert!(timeout(WAIT, inbox.recv()).await.unwrap().is_none());
    }
}
