//! Metrics setup and initialization.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

use super::cache::register_cache_metrics;
use super::http::register_http_metrics;

/// Buckets de los histogramas, en segundos (100us a 10s).
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Inicializa el sistema de metricas y retorna el handle para el endpoint.
///
/// # Errors
///
/// Falla si ya hay un recorder global instalado.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)?
        .install_recorder()?;

    register_cache_metrics();
    register_http_metrics();

    info!("Metrics system initialized");
    Ok(handle)
}

/// Construye un recorder sin instalarlo globalmente (para tests).
pub fn build_test_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
