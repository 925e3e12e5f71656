//! Cache metrics recording.

use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registra las metricas de cache.
/// Llamar una vez al inicio para registrar las metricas.
pub fn register_cache_metrics() {
    metrics::describe_counter!("review_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!("review_cache_misses_total", "Total number of cache misses");
    metrics::describe_counter!(
        "review_cache_stale_total",
        "Entries found but discarded because a dependency token fired"
    );
    metrics::describe_counter!(
        "review_cache_joins_total",
        "Callers that joined an in-flight computation"
    );
    metrics::describe_counter!(
        "review_cache_bypass_total",
        "Reads computed directly because the key was not cacheable"
    );
    metrics::describe_counter!(
        "review_cache_producer_failures_total",
        "Producer executions that returned an error"
    );
    metrics::describe_counter!(
        "review_cache_evictions_total",
        "Total number of cache evictions"
    );
    metrics::describe_counter!(
        "review_cache_region_invalidations_total",
        "Change tokens fired per region"
    );
    metrics::describe_gauge!("review_cache_entries", "Current number of entries in cache");
    metrics::describe_histogram!(
        "review_cache_operation_seconds",
        "Time spent on cache operations"
    );
}

/// Registra una invalidacion de region (`kind` = global | dimension).
pub fn record_region_invalidation(region: &str, kind: &'static str) {
    counter!(
        "review_cache_region_invalidations_total",
        "region" => region.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Recorder de metricas de un cache.
/// Usa atomic counters internos para consultas rapidas en tests y logs.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    name: Arc<str>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    joins: Arc<AtomicU64>,
    producer_failures: Arc<AtomicU64>,
}

impl CacheMetrics {
    /// Crea un recorder etiquetado con el nombre del cache.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            joins: Arc::new(AtomicU64::new(0)),
            producer_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    fn label(&self) -> String {
        self.name.to_string()
    }

    /// Registra un cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("review_cache_hits_total", "cache" => self.label()).increment(1);
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("review_cache_misses_total", "cache" => self.label()).increment(1);
    }

    /// Registra una entry descartada por token disparado
    pub fn record_stale(&self) {
        counter!("review_cache_stale_total", "cache" => self.label()).increment(1);
    }

    /// Registra un caller que se unio a un calculo en curso
    pub fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
        counter!("review_cache_joins_total", "cache" => self.label()).increment(1);
    }

    /// Registra una lectura sin cache (key no cacheable)
    pub fn record_bypass(&self) {
        counter!("review_cache_bypass_total", "cache" => self.label()).increment(1);
    }

    /// Registra un error del producer
    pub fn record_producer_failure(&self) {
        self.producer_failures.fetch_add(1, Ordering::Relaxed);
        counter!("review_cache_producer_failures_total", "cache" => self.label()).increment(1);
    }

    /// Registra una eviction
    pub fn record_eviction(&self, reason: &'static str) {
        counter!(
            "review_cache_evictions_total",
            "cache" => self.label(),
            "reason" => reason
        )
        .increment(1);
    }

    /// Actualiza el gauge de entries
    pub fn update_entry_count(&self, count: u64) {
        gauge!("review_cache_entries", "cache" => self.label()).set(count as f64);
    }

    /// Registra la duracion de una operacion
    pub fn record_operation_duration(&self, operation: &'static str, duration: Duration) {
        histogram!(
            "review_cache_operation_seconds",
            "cache" => self.label(),
            "operation" => operation
        )
        .record(duration.as_secs_f64());
    }

    /// Calcula hit rate (para logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let misses = self.misses() as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    /// Nombre del cache
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn joins(&self) -> u64 {
        self.joins.load(Ordering::Relaxed)
    }

    pub fn producer_failures(&self) -> u64 {
        self.producer_failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_metrics_hit_rate() {
        let metrics = CacheMetrics::new("reviews");

        // 3 hits, 1 miss = 75% hit rate
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();

        let rate = metrics.hit_rate();
        assert!((rate - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_cache_metrics_zero_total() {
        let metrics = CacheMetrics::new("reviews");
        assert_eq!(metrics.hit_rate(), 0.0);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = CacheMetrics::new("reviews");
        let clone = metrics.clone();

        clone.record_join();
        clone.record_producer_failure();

        assert_eq!(metrics.joins(), 1);
        assert_eq!(metrics.producer_failures(), 1);
        assert_eq!(metrics.name(), "reviews");
    }
}
