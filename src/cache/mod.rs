//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod entry;
mod heap;
mod lru;
mod shared;
mod stats;
pub(crate) mod store;


// Re-export public types
pub use shared::LruTtlCache;
pub use stats::CacheStats;
