//! Review Server - HTTP gateway for customer reviews
//!
//! Serves review searches and product ratings from a read-through cache in
//! front of the remote review API. Writes pass through to the remote API and
//! invalidate exactly the cached reads they affect.

pub mod cache;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod service;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use server::{create_router, create_router_with_state, run_server_with_state};
pub use service::ReviewCacheClient;
pub use settings::{Settings, SettingsError};
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
