//! Review gateway binary.

use std::sync::Arc;

use anyhow::Context;
use review_api::{HttpReviewApi, ReviewApi};
use review_server::cache::{CacheRegions, UpstreamChangeWatcher};
use review_server::metrics::init_metrics;
use review_server::{AppState, ReviewCacheClient, Settings, run_server_with_state};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let addr = settings.socket_addr()?;

    tracing::info!(
        "Starting review gateway v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Review API: {}", settings.api.base_url);
    tracing::info!(
        ttl_seconds = settings.cache.ttl_seconds,
        max_capacity = settings.cache.max_capacity,
        "Cache configured"
    );

    let prometheus_handle = init_metrics().context("failed to initialize metrics")?;

    let api_config = settings
        .api_config()
        .context("invalid review API configuration")?;
    let api: Arc<dyn ReviewApi> =
        Arc::new(HttpReviewApi::new(api_config).context("failed to build review API client")?);

    let regions = Arc::new(CacheRegions::new());
    let client = ReviewCacheClient::new(Arc::clone(&api), regions, settings.cache_config());
    let mut state = AppState::new(client.clone());

    // El handle detiene el watcher al salir de main
    let _watcher = if settings.watcher.enabled {
        let watcher = UpstreamChangeWatcher::new(
            api,
            client.upstream_region(),
            settings.watcher_config(),
        );
        state = state.with_watcher(watcher.state());
        Some(watcher.start())
    } else {
        tracing::info!("Upstream change watcher disabled");
        None
    };

    run_server_with_state(addr, state, prometheus_handle).await?;

    Ok(())
}
