//! # Driving Ports (Inbound API)
//!
//! The API a connected location client exposes to the application.

use super::outbound::DeliveryHandler;
use crate::domain::{GeoClientError, QoS};
use async_trait::async_trait;

/// Position-driven subscribe/publish API.
///
/// Mutating calls take `&mut self`; one client instance is driven by one
/// caller at a time.
///
/// # Example
///
/// ```rust,ignore
/// use geo_client::ports::LocationApi;
///
/// async fn follow<L: LocationApi>(client: &mut L, track: &[(f64, f64)], handler: DeliveryHandler) {
///     for &(lat, lng) in track {
///         client.update_subscribe(lat, lng, QoS::AtMostOnce, handler.clone()).await?;
///         client.publish(lat, lng, QoS::AtMostOnce, false, b"{}".to_vec()).await?;
///     }
/// }
/// ```
#[async_trait]
pub trait LocationApi: Send {
    /// Re-cover the interest disc at `(lat, lng)` and bring the transport's
    /// subscriptions in line with it.
    ///
    /// # Errors
    ///
    /// - `SubscriptionOperation` when a subscribe, unsubscribe or control
    ///   publish fails. Pairs completed before the failure stay applied;
    ///   calling again with the same position finishes the rest.
    async fn update_subscribe(
        &mut self,
        lat: f64,
        lng: f64,
        qos: QoS,
        handler: DeliveryHandler,
    ) -> Result<(), GeoClientError>;

    /// Publish `payload` to the exact cell at `(lat, lng)` under the
    /// configured prefix.
    async fn publish(
        &self,
        lat: f64,
        lng: f64,
        qos: QoS,
        retained: bool,
        payload: Vec<u8>,
    ) -> Result<(), GeoClientError>;

    /// Drop every tracked subscription.
    async fn unsubscribe(&mut self) -> Result<(), GeoClientError>;

    /// Tracked subscription filters, tombstones excluded.
    fn subscriptions(&self) -> Vec<String>;
}
