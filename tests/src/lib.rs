//! # Geo Client Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── codec_benchmarks.rs   # codec, diff and selection hot paths
//! └── src/integration/          # discovery and subscription flows over geo-bus
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p geo-tests
//! RUST_LOG=geo_client=trace cargo test -p geo-tests integration::subscription
//! cargo bench -p geo-tests
//! ```

#![allow(unused_variables)]
#![allow(dead_code)]

pub mod integration;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly subscriber once per process; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
