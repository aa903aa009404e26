//! # Client Services
//!
//! - [`GatewayDiscovery`]: manager round-trip, catalog wait, gateway selection
//! - [`LocationClient`]: the `LocationApi` façade over one broker transport
//!
//! ```text
//! GatewayDiscovery::connect(lat, lng)
//!        │
//!        ▼
//! LocationClient ── update_subscribe ──► covering ─► topics ─► diff ─► (un)subscribe + (un)register
//!                └─ publish ───────────► exact cell ─► prefix + topic ─► publish (bounded wait)
//! ```

mod discovery;
mod location;

pub use discovery::{GatewayDiscovery, MANAGER_QUIESCE};
pub use location::LocationClient;
