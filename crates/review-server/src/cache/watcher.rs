//! Background watcher for review changes made outside this gateway.
//!
//! Polls the remote API change marker and fires the upstream region when it
//! moves. The webhook endpoint fires the same region directly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use review_api::{ReviewApi, ReviewApiError};
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, warn};

use super::region::CacheRegion;

/// Periodo minimo del timer; `interval` no acepta cero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Configuration for the upstream change watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Interval between polls.
    pub interval: Duration,
    /// Consecutive failures tolerated before backing off.
    pub max_failures: u32,
    /// Backoff multiplier for failures.
    pub backoff_multiplier: f64,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_failures: 3,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(300),
        }
    }
}

/// Estado observable del watcher.
#[derive(Debug, Default)]
pub struct WatcherState {
    inner: Mutex<StateInner>,
}

#[derive(Debug, Default)]
struct StateInner {
    /// `true` desde el primer poll exitoso.
    observed: bool,
    marker: Option<String>,
    failure_count: u32,
    last_success: Option<Instant>,
    last_error: Option<String>,
}

impl WatcherState {
    /// Ultimo marker observado.
    pub fn marker(&self) -> Option<String> {
        self.inner.lock().marker.clone()
    }

    /// Fallos consecutivos.
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    /// Tiempo desde el ultimo poll exitoso.
    pub fn since_last_success(&self) -> Option<Duration> {
        self.inner.lock().last_success.map(|t| t.elapsed())
    }

    /// Registra un poll exitoso.
    ///
    /// Retorna el marker anterior, o `None` si es el primer poll exitoso
    /// (distinto de `Some(None)`: el poll anterior no vio marker).
    fn record_success(&self, marker: Option<String>) -> Option<Option<String>> {
        let mut inner = self.inner.lock();
        inner.failure_count = 0;
        inner.last_success = Some(Instant::now());
        inner.last_error = None;
        let previous = std::mem::replace(&mut inner.marker, marker);
        std::mem::replace(&mut inner.observed, true).then_some(previous)
    }

    fn record_failure(&self, error: String) -> u32 {
        let mut inner = self.inner.lock();
        inner.failure_count += 1;
        inner.last_error = Some(error);
        inner.failure_count
    }
}

/// Handle for controlling a running watcher. Dropping it stops the watcher.
pub struct WatcherHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl WatcherHandle {
    /// Signals the watcher to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poller del change marker del API remoto.
pub struct UpstreamChangeWatcher {
    api: Arc<dyn ReviewApi>,
    region: Arc<CacheRegion>,
    config: WatcherConfig,
    state: Arc<WatcherState>,
    current_backoff: Mutex<Duration>,
}

impl UpstreamChangeWatcher {
    /// Creates a watcher that fires `region` when the upstream marker moves.
    pub fn new(api: Arc<dyn ReviewApi>, region: Arc<CacheRegion>, config: WatcherConfig) -> Self {
        Self {
            api,
            region,
            current_backoff: Mutex::new(config.interval),
            config,
            state: Arc::new(WatcherState::default()),
        }
    }

    /// Returns the shared watcher state.
    pub fn state(&self) -> Arc<WatcherState> {
        Arc::clone(&self.state)
    }

    /// Current delay between polls.
    pub fn current_backoff(&self) -> Duration {
        *self.current_backoff.lock()
    }

    /// Starts the background polling task.
    pub fn start(self) -> WatcherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = WatcherHandle { shutdown_tx };

        tokio::spawn(self.run(shutdown_rx));

        handle
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut timer = interval(self.config.interval.max(MIN_PERIOD));

        info!(
            api = self.api.name(),
            region = self.region.name(),
            "Starting upstream change watcher with interval {:?}",
            self.config.interval
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let _ = self.poll_once().await;

                    let current = self.current_backoff().max(MIN_PERIOD);
                    if current != timer.period() {
                        timer = interval(current);
                        // El primer tick de un interval nuevo es inmediato
                        timer.tick().await;
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Upstream change watcher shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Consulta el marker una vez.
    ///
    /// Retorna `Ok(true)` si el marker cambio y se invalido la region. El
    /// primer marker observado solo se registra.
    pub async fn poll_once(&self) -> Result<bool, ReviewApiError> {
        match self.api.change_marker().await {
            Ok(marker) => {
                let previous = self.state.record_success(marker.clone());
                self.reset_backoff();

                // El primer poll solo registra; despues cualquier diferencia
                // (incluido aparecer o desaparecer) es un cambio
                let changed = previous.as_ref().is_some_and(|old| *old != marker);

                if changed {
                    info!(
                        previous = ?previous.flatten(),
                        current = ?marker,
                        "Upstream reviews changed, invalidating region"
                    );
                    self.region.invalidate();
                } else {
                    debug!(marker = ?marker, "Upstream marker unchanged");
                }
                Ok(changed)
            },
            Err(e) => {
                let failures = self.state.record_failure(e.to_string());
                self.increase_backoff(failures);
                warn!(failures, "Upstream change poll failed: {}", e);
                Err(e)
            },
        }
    }

    fn reset_backoff(&self) {
        *self.current_backoff.lock() = self.config.interval;
    }

    fn increase_backoff(&self, failure_count: u32) {
        if failure_count < self.config.max_failures {
            return;
        }

        let mut backoff = self.current_backoff.lock();
        // Nunca por debajo del intervalo: un periodo cero hace panic en interval()
        let ceiling = self.config.max_backoff.max(self.config.interval);
        let next = Duration::try_from_secs_f64(backoff.as_secs_f64() * self.config.backoff_multiplier)
            .unwrap_or(ceiling);
        *backoff = next.clamp(self.config.interval, ceiling);

        debug!(
            "Increased backoff to {:?} after {} failures",
            *backoff, failure_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use review_api::ReviewSearchResult;
    use review_core::{
        AssessmentRequest, CustomerReviewRequest, ProductId, ReviewId, ReviewSearchCriteria,
    };
    use std::collections::VecDeque;

    /// API que devuelve una secuencia fija de markers.
    struct MarkerApi {
        markers: Mutex<VecDeque<Result<Option<String>, ReviewApiError>>>,
    }

    impl MarkerApi {
        fn new(markers: Vec<Result<Option<String>, ReviewApiError>>) -> Arc<Self> {
            Arc::new(Self {
                markers: Mutex::new(markers.into()),
            })
        }
    }

    #[async_trait]
    impl ReviewApi for MarkerApi {
        async fn search(
            &self,
            _criteria: &ReviewSearchCriteria,
        ) -> Result<ReviewSearchResult, ReviewApiError> {
            Ok(ReviewSearchResult::new(Vec::new(), 0))
        }

        async fn get_rating(&self, _product_id: &ProductId) -> Result<Option<f64>, ReviewApiError> {
            Ok(None)
        }

        async fn upsert(&self, _reviews: Vec<CustomerReviewRequest>) -> Result<(), ReviewApiError> {
            Ok(())
        }

        async fn delete(&self, _review_ids: Vec<ReviewId>) -> Result<(), ReviewApiError> {
            Ok(())
        }

        async fn add_assessment(
            &self,
            _review_id: &ReviewId,
            _assessment: AssessmentRequest,
        ) -> Result<(), ReviewApiError> {
            Ok(())
        }

        async fn change_marker(&self) -> Result<Option<String>, ReviewApiError> {
            self.markers.lock().pop_front().unwrap_or(Ok(None))
        }

        fn name(&self) -> &str {
            "markers"
        }
    }

    fn marker(value: &str) -> Result<Option<String>, ReviewApiError> {
        Ok(Some(value.to_string()))
    }

    fn watcher(api: Arc<MarkerApi>, config: WatcherConfig) -> (UpstreamChangeWatcher, Arc<CacheRegion>) {
        let region = Arc::new(CacheRegion::new("ReviewApiChanges"));
        (
            UpstreamChangeWatcher::new(api, Arc::clone(&region), config),
            region,
        )
    }

    #[test]
    fn test_watcher_config_default() {
        let config = WatcherConfig::default();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.max_failures, 3);
        assert_eq!(config.backoff_multiplier, 2.0);
        assert_eq!(config.max_backoff, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_first_marker_only_recorded() {
        let (watcher, region) = watcher(MarkerApi::new(vec![marker("m1")]), WatcherConfig::default());
        let token = region.create_change_token();

        assert!(!watcher.poll_once().await.unwrap());
        assert!(!token.has_changed());
        assert_eq!(watcher.state().marker().as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn test_changed_marker_invalidates_region() {
        let api = MarkerApi::new(vec![marker("m1"), marker("m1"), marker("m2")]);
        let (watcher, region) = watcher(api, WatcherConfig::default());
        let token = region.create_change_token();

        assert!(!watcher.poll_once().await.unwrap());
        assert!(!watcher.poll_once().await.unwrap());
        assert!(!token.has_changed());

        assert!(watcher.poll_once().await.unwrap());
        assert!(token.has_changed());
    }

    #[tokio::test]
    async fn test_marker_appearing_after_empty_poll_invalidates() {
        let api = MarkerApi::new(vec![Ok(None), marker("m1")]);
        let (watcher, region) = watcher(api, WatcherConfig::default());
        let token = region.create_change_token();

        assert!(!watcher.poll_once().await.unwrap());
        assert!(!token.has_changed());

        assert!(watcher.poll_once().await.unwrap());
        assert!(token.has_changed());
    }

    #[tokio::test]
    async fn test_marker_vanishing_and_returning_invalidates_twice() {
        let api = MarkerApi::new(vec![marker("m1"), Ok(None), marker("m1")]);
        let (watcher, region) = watcher(api, WatcherConfig::default());

        assert!(!watcher.poll_once().await.unwrap());

        let before_vanish = region.create_change_token();
        assert!(watcher.poll_once().await.unwrap());
        assert!(before_vanish.has_changed());

        let before_return = region.create_change_token();
        assert!(watcher.poll_once().await.unwrap());
        assert!(before_return.has_changed());
        assert_eq!(watcher.state().marker().as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn test_failed_first_poll_does_not_count_as_observed() {
        let api = MarkerApi::new(vec![Err(ReviewApiError::unavailable("down")), Ok(None)]);
        let (watcher, region) = watcher(api, WatcherConfig::default());
        let token = region.create_change_token();

        assert!(watcher.poll_once().await.is_err());
        assert!(!watcher.poll_once().await.unwrap());
        assert!(!token.has_changed());
    }

    #[tokio::test]
    async fn test_backoff_never_drops_below_interval() {
        let config = WatcherConfig {
            interval: Duration::from_secs(5),
            max_failures: 1,
            backoff_multiplier: 2.0,
            max_backoff: Duration::ZERO,
        };
        let api = MarkerApi::new(vec![
            Err(ReviewApiError::unavailable("down")),
            Err(ReviewApiError::unavailable("down")),
        ]);
        let (watcher, _region) = watcher(api, config);

        assert!(watcher.poll_once().await.is_err());
        assert_eq!(watcher.current_backoff(), Duration::from_secs(5));
        assert!(watcher.poll_once().await.is_err());
        assert_eq!(watcher.current_backoff(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_infinite_multiplier_caps_at_max_backoff() {
        let config = WatcherConfig {
            interval: Duration::from_secs(5),
            max_failures: 1,
            backoff_multiplier: f64::INFINITY,
            max_backoff: Duration::from_secs(60),
        };
        let api = MarkerApi::new(vec![Err(ReviewApiError::unavailable("down"))]);
        let (watcher, _region) = watcher(api, config);

        assert!(watcher.poll_once().await.is_err());
        assert_eq!(watcher.current_backoff(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_watcher_survives_zero_max_backoff() {
        let api = MarkerApi::new(vec![
            marker("m1"),
            Err(ReviewApiError::unavailable("down")),
            marker("m2"),
        ]);
        let config = WatcherConfig {
            interval: Duration::from_secs(1),
            max_failures: 1,
            backoff_multiplier: 2.0,
            max_backoff: Duration::ZERO,
        };
        let (watcher, region) = watcher(api, config);
        let token = region.create_change_token();
        let state = watcher.state();

        let handle = watcher.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(token.has_changed());
        assert_eq!(state.marker().as_deref(), Some("m2"));
        assert_eq!(state.failure_count(), 0);
        drop(handle);
    }

    #[tokio::test]
    async fn test_backoff_after_max_failures() {
        let config = WatcherConfig {
            interval: Duration::from_secs(10),
            max_failures: 2,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        };
        let api = MarkerApi::new(vec![
            Err(ReviewApiError::unavailable("down")),
            Err(ReviewApiError::unavailable("down")),
            Err(ReviewApiError::unavailable("down")),
            Err(ReviewApiError::unavailable("down")),
            marker("m1"),
        ]);
        let (watcher, _region) = watcher(api, config);

        assert!(watcher.poll_once().await.is_err());
        assert_eq!(watcher.current_backoff(), Duration::from_secs(10));

        assert!(watcher.poll_once().await.is_err());
        assert_eq!(watcher.current_backoff(), Duration::from_secs(20));

        assert!(watcher.poll_once().await.is_err());
        assert_eq!(watcher.current_backoff(), Duration::from_secs(30));

        assert!(watcher.poll_once().await.is_err());
        assert_eq!(watcher.current_backoff(), Duration::from_secs(30));
        assert_eq!(watcher.state().failure_count(), 4);

        watcher.poll_once().await.unwrap();
        assert_eq!(watcher.current_backoff(), Duration::from_secs(10));
        assert_eq!(watcher.state().failure_count(), 0);
        assert!(watcher.state().last_error().is_none());
    }

    #[test]
    fn test_watcher_handle_stop() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = WatcherHandle { shutdown_tx };

        assert!(!*shutdown_rx.borrow());
        handle.stop();
        assert!(*shutdown_rx.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_watcher_polls_until_stopped() {
        let api = MarkerApi::new(vec![marker("m1"), marker("m2")]);
        let config = WatcherConfig {
            interval: Duration::from_secs(1),
            ..WatcherConfig::default()
        };
        let (watcher, region) = watcher(api, config);
        let token = region.create_change_token();
        let state = watcher.state();

        let handle = watcher.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(token.has_changed());
        assert_eq!(state.marker().as_deref(), Some("m2"));
        drop(handle);
    }
}
