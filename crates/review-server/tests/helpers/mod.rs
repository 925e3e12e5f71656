//! Test helpers para review-server.

#![allow(dead_code, unused_imports)]

pub mod client;
pub mod mock_api;

pub use client::{TestClient, TestResponse, client};
pub use mock_api::{Failure, MockReviewApi};

use std::sync::Arc;

use axum::Router;
use review_server::cache::{CacheConfig, CacheRegions};
use review_server::metrics::build_test_handle;
use review_server::{AppState, ReviewCacheClient, create_router_with_state};

/// Cliente cacheado sobre el mock, con regiones nuevas.
pub fn review_client(api: &Arc<MockReviewApi>) -> ReviewCacheClient {
    ReviewCacheClient::new(
        Arc::clone(api) as Arc<dyn review_api::ReviewApi>,
        Arc::new(CacheRegions::new()),
        CacheConfig::default(),
    )
}

/// Router completo sobre el mock.
pub fn app_with(api: &Arc<MockReviewApi>) -> (Router, ReviewCacheClient) {
    let client = review_client(api);
    let router = create_router_with_state(AppState::new(client.clone()), build_test_handle());
    (router, client)
}
