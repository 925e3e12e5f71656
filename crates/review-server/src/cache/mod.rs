//! Cache module for the review gateway.
//!
//! This module provides the read-through cache layer: canonical keys,
//! change tokens grouped in regions, a single-flight cache backed by Moka,
//! and the watcher that turns upstream change markers into invalidations.

pub mod keys;
pub mod region;
pub mod single_flight;
pub mod token;
pub mod watcher;

// Re-exports
pub use keys::{CacheKey, CacheKeyBuilder};
pub use region::{CacheRegion, CacheRegions};
pub use single_flight::{CacheConfig, CacheError, Computed, SingleFlightCache};
pub use token::ChangeToken;
pub use watcher::{UpstreamChangeWatcher, WatcherConfig, WatcherHandle, WatcherState};
