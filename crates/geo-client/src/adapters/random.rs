//! # Random Source Adapters
//!
//! | Adapter | Use |
//! |---------|-----|
//! | `FixedRandomSource` | deterministic tests, always the same index |
//! | `SeededRandomSource` | production gateway tie-breaking (`rand::StdRng`) |

use crate::ports::RandomSource;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed random source for deterministic testing.
///
/// # Example
///
/// ```rust
/// use geo_client::adapters::FixedRandomSource;
/// use geo_client::ports::RandomSource;
///
/// let rng = FixedRandomSource::new(5);
/// assert_eq!(rng.random_usize(3), 2);
/// assert_eq!(rng.random_usize(0), 0);
/// ```
#[derive(Debug, Clone)]
pub struct FixedRandomSource {
    value: usize,
}

impl FixedRandomSource {
    /// Source that always yields `value % max`.
    pub fn new(value: usize) -> Self {
        Self { value }
    }

    /// Source that always picks the first element.
    pub fn first() -> Self {
        Self::new(0)
    }
}

impl RandomSource for FixedRandomSource {
    fn random_usize(&self, max: usize) -> usize {
        if max == 0 {
            0
        } else {
            self.value % max
        }
    }
}

/// Pseudo-random source backed by [`StdRng`].
#[derive(Debug)]
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
}

impl SeededRandomSource {
    /// Reproducible sequence from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl Default for SeededRandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for SeededRandomSource {
    fn random_usize(&self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        self.rng.lock().gen_range(0..max)
    }
}
