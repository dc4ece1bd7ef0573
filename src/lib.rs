//! LRU TTL Cache - An in-process, capacity-bounded key/value cache
//!
//! Combines least-recently-used eviction with optional per-entry TTL
//! expiration, shared safely between threads, with an optional background
//! sweeper for expired entries.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, LruTtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{spawn_sweeper, SweeperHandle};
