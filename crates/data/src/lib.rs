//! Concurrent OHLCV data-access layer.
//!
//! Materialises contiguous OHLCV windows from per-day CSV files on disk,
//! with LRU result caching, modification-time-aware invalidation, a
//! file-stat TTL cache, memory-pressure-driven eviction, and an observer
//! hook for cache events.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]

pub mod error;
pub mod lru;
pub mod memory;
pub mod observer;
pub mod stat_cache;
pub mod store;

pub use crate::error::DataError;
pub use crate::memory::MemoryTracker;
pub use crate::observer::{CacheEvent, CacheObserver, CacheStatistics};
pub use crate::stat_cache::FileStatCache;
pub use crate::store::OhlcvStore;
