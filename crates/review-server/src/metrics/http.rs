//! HTTP metrics middleware.

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use metrics::{counter, gauge, histogram};

use crate::extractors::USER_ID_HEADER;

const REQUESTS_TOTAL: &str = "review_http_requests_total";
const REQUEST_DURATION: &str = "review_http_request_duration_seconds";
const REQUESTS_IN_FLIGHT: &str = "review_http_requests_in_flight";

/// "2xx", "4xx", ... para no tener una serie por status.
fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

/// Registra contador, duracion y requests en curso.
///
/// El label `path` es la ruta matcheada (`/products/{product_id}/rating`),
/// nunca la URI concreta. `caller` distingue anonimos de autenticados sin
/// exponer el id del usuario.
pub async fn http_metrics_middleware(
    matched_path: Option<MatchedPath>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = matched_path.map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let caller = if request.headers().contains_key(&USER_ID_HEADER) {
        "authenticated"
    } else {
        "anonymous"
    };

    let in_flight = gauge!(REQUESTS_IN_FLIGHT);
    in_flight.increment(1.0);
    let response = next.run(request).await;
    in_flight.decrement(1.0);

    let class = status_class(response.status().as_u16());
    counter!(
        REQUESTS_TOTAL,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => class,
        "caller" => caller
    )
    .increment(1);
    histogram!(REQUEST_DURATION, "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

/// Registra las metricas HTTP
pub fn register_http_metrics() {
    metrics::describe_counter!(REQUESTS_TOTAL, "HTTP requests by route, status class and caller");
    metrics::describe_histogram!(
        REQUEST_DURATION,
        metrics::Unit::Seconds,
        "HTTP request duration"
    );
    metrics::describe_gauge!(REQUESTS_IN_FLIGHT, "HTTP requests currently being served");
}
