//! Configuration Module
//!
//! Construction parameters for a cache and its background sweeper.

use std::time::Duration;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Interval between background expiry sweeps; zero disables the sweeper
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a config with the given capacity and sweep interval.
    pub fn new(capacity: usize, sweep_interval: Duration) -> Self {
        Self {
            capacity,
            sweep_interval,
        }
    }

    /// Returns a copy of this config with background sweeping disabled.
    pub fn without_sweeper(mut self) -> Self {
        self.sweep_interval = Duration::ZERO;
        self
    }

    /// Returns true if a background sweeper should be started.
    pub fn sweeper_enabled(&self) -> bool {
        !self.sweep_interval.is_zero()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            sweep_interval: Duration::from_secs(1),
        }
    }
}
