//! HTTP handlers.

pub mod health;
pub mod invalidate;
pub mod metrics;
pub mod reviews;
