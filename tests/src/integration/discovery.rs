//! # Gateway Discovery Flows
//!
//! Manager round-trip, catalog handling and gateway selection over geo-bus.

#[cfg(test)]
mod tests {
    use super::super::*;
    use geo_bus::{BusMessage, MessagePublisher};
    use geo_client::{
        BrokerRole, BusConnector, ClientConfig, GatewayDiscovery, GeoClientError, LocationApi,
        S2Geometry, SeededRandomSource, TomlConfigProvider,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn short_timeout() -> ClientConfig {
        let mut config = ClientConfig::default();
        config.discovery.catalog_timeout_ms = 200;
        config
    }

    #[tokio::test]
    async fn test_selects_longest_matching_region() {
        let deployment = Deployment::new();
        let fine = deployment.gateway("gw-fine", 1884);
        deployment.gateway("gw-coarse", 1885);
        deployment
            .publish_catalog(&catalog(&[
                (COARSE_REGION, "gw-coarse", 1885),
                (FINE_REGION, "gw-fine", 1884),
            ]))
            .await;

        let client = deployment.discovery().connect(1.0, 1.0).await.unwrap();

        assert!(Arc::ptr_eq(client.transport().broker(), &fine));
        assert!(client.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_coarse_region() {
        let deployment = Deployment::new();
        let coarse = deployment.gateway("gw-coarse", 1885);
        deployment
            .publish_catalog(&catalog(&[
                ("/5/1", "gw-fine", 1884),
                (COARSE_REGION, "gw-coarse", 1885),
            ]))
            .await;

        let client = deployment.discovery().connect(1.0, 1.0).await.unwrap();

        assert!(Arc::ptr_eq(client.transport().broker(), &coarse));
    }

    #[tokio::test]
    async fn test_tied_regions_pick_one_of_them() {
        let deployment = Deployment::new();
        let a = deployment.gateway("gw-a", 1884);
        let b = deployment.gateway("gw-b", 1886);
        deployment
            .publish_catalog(&catalog(&[
                (FINE_REGION, "gw-a", 1884),
                (FINE_REGION, "gw-b", 1886),
                (COARSE_REGION, "gw-coarse", 1885),
            ]))
            .await;

        let client = deployment.discovery().connect(1.0, 1.0).await.unwrap();
        let broker = client.transport().broker();

        assert!(Arc::ptr_eq(broker, &a) || Arc::ptr_eq(broker, &b));
    }

    #[tokio::test]
    async fn test_discovery_configured_from_toml() {
        let deployment = Deployment::new();
        let fine = deployment.gateway("gw-fine", 1884);
        let manager = deployment.registry.start("manager.internal", 2883);
        manager
            .publish(
                BusMessage::new("/catalog/v2", catalog(&[(FINE_REGION, "gw-fine", 1884)]))
                    .retained(),
            )
            .await
            .unwrap();
        let provider = TomlConfigProvider::parse(
            r#"
            [manager]
            host = "manager.internal"
            port = 2883

            [discovery]
            catalog_topic = "/catalog/v2"
            "#,
        )
        .unwrap();

        let discovery = GatewayDiscovery::from_provider(
            BusConnector::new(Arc::clone(&deployment.registry)),
            Arc::new(S2Geometry::new()),
            Arc::new(SeededRandomSource::new(7)),
            &provider,
        )
        .unwrap();
        let client = discovery.connect(1.0, 1.0).await.unwrap();

        assert!(Arc::ptr_eq(client.transport().broker(), &fine));
    }

    #[tokio::test]
    async fn test_silent_manager_times_out() {
        let deployment = Deployment::new();

        let result = deployment
            .discovery_with(short_timeout())
            .connect(1.0, 1.0)
            .await;

        assert!(matches!(
            result,
            Err(GeoClientError::Timeout(wait)) if wait == Duration::from_millis(200)
        ));
    }

    #[tokio::test]
    async fn test_empty_catalog_fails_with_gateway_info() {
        let deployment = Deployment::new();
        deployment.publish_catalog("[]").await;

        let result = deployment.discovery().connect(1.0, 1.0).await;

        assert!(matches!(result, Err(GeoClientError::GatewayInfo)));
    }

    #[tokio::test]
    async fn test_no_region_contains_position() {
        let deployment = Deployment::new();
        deployment
            .publish_catalog(&catalog(&[("/5", "gw-far", 1890)]))
            .await;

        let result = deployment.discovery().connect(1.0, 1.0).await;

        match result {
            Err(GeoClientError::NoGatewayMatch { topic }) => {
                assert!(topic.starts_with(FINE_REGION));
                assert_eq!(topic.split('/').count(), 32);
            }
            other => panic!("expected NoGatewayMatch, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_unreachable_manager() {
        let deployment = Deployment::new();
        let mut config = ClientConfig::default();
        config.manager = endpoint("manager.down", 1883);

        let result = deployment.discovery_with(config).connect(1.0, 1.0).await;

        match result {
            Err(GeoClientError::TransportConnect { role, uri, .. }) => {
                assert_eq!(role, BrokerRole::Manager);
                assert_eq!(uri, "tcp://manager.down:1883");
            }
            other => panic!("expected TransportConnect, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let deployment = Deployment::new();
        deployment
            .publish_catalog(&catalog(&[(FINE_REGION, "gw-down", 1999)]))
            .await;

        let result = deployment.discovery().connect(1.0, 1.0).await;

        match result {
            Err(GeoClientError::TransportConnect { role, uri, .. }) => {
                assert_eq!(role, BrokerRole::Gateway);
                assert_eq!(uri, "tcp://gw-down:1999");
            }
            other => panic!("expected TransportConnect, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_malformed_catalog_is_skipped_for_a_later_valid_one() {
        let deployment = Deployment::new();
        let fine = deployment.gateway("gw-fine", 1884);
        let manager = Arc::clone(&deployment.manager);
        let valid = catalog(&[(FINE_REGION, "gw-fine", 1884)]);

        let publisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            manager
                .publish(BusMessage::new(CATALOG_TOPIC, "{not json"))
                .await
                .unwrap();
            manager
                .publish(BusMessage::new(CATALOG_TOPIC, valid))
                .await
                .unwrap();
        });

        let client = deployment.discovery().connect(1.0, 1.0).await.unwrap();
        publisher.await.unwrap();

        assert!(Arc::ptr_eq(client.transport().broker(), &fine));
    }

    #[tokio::test]
    async fn test_manager_subscription_released_after_discovery() {
        let deployment = Deployment::new();
        deployment.gateway("gw-fine", 1884);
        deployment
            .publish_catalog(&catalog(&[(FINE_REGION, "gw-fine", 1884)]))
            .await;

        let _client = deployment.discovery().connect(1.0, 1.0).await.unwrap();

        // Aborted delivery tasks drop their bus subscriptions on the next tick.
        for _ in 0..50 {
            if deployment.manager.subscription_count(CATALOG_TOPIC) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(deployment.manager.subscription_count(CATALOG_TOPIC), 0);
    }
}
