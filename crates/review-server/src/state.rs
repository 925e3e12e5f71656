//! Application state.

use std::sync::Arc;

use crate::cache::{CacheRegions, WatcherState};
use crate::service::ReviewCacheClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    client: ReviewCacheClient,
    watcher: Option<Arc<WatcherState>>,
}

impl AppState {
    /// Creates a new AppState around the cached review client.
    pub fn new(client: ReviewCacheClient) -> Self {
        Self {
            client,
            watcher: None,
        }
    }

    /// Attaches the upstream watcher state, reported by readiness.
    pub fn with_watcher(mut self, watcher: Arc<WatcherState>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Returns the cached review client.
    pub fn client(&self) -> &ReviewCacheClient {
        &self.client
    }

    /// Returns the region registry.
    pub fn regions(&self) -> &Arc<CacheRegions> {
        self.client.regions()
    }

    /// Returns the watcher state, if the watcher is running.
    pub fn watcher(&self) -> Option<&Arc<WatcherState>> {
        self.watcher.as_ref()
    }
}
