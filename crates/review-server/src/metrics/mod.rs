//! Metrics module for the review gateway.

pub mod cache;
pub mod http;
pub mod setup;

pub use cache::CacheMetrics;
pub use setup::{build_test_handle, init_metrics};
