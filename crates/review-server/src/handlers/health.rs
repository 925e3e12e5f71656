use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "UP".to_string(),
        }
    }
}

/// Liveness: el proceso responde.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub status: String,
    pub upstream: UpstreamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watcher: Option<WatcherStatus>,
}

#[derive(Debug, Serialize)]
pub struct UpstreamStatus {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherStatus {
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub seconds_since_last_success: Option<u64>,
}

/// GET /health/ready
/// Readiness: el API remoto responde. 503 si no.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let client = state.client();
    let (status, upstream) = match client.check_upstream().await {
        Ok(()) => (
            StatusCode::OK,
            UpstreamStatus {
                name: client.api_name().to_string(),
                status: "UP".to_string(),
                error: None,
            },
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            UpstreamStatus {
                name: client.api_name().to_string(),
                status: "DOWN".to_string(),
                error: Some(e.to_string()),
            },
        ),
    };

    let watcher = state.watcher().map(|w| WatcherStatus {
        consecutive_failures: w.failure_count(),
        last_error: w.last_error(),
        seconds_since_last_success: w.since_last_success().map(|d| d.as_secs()),
    });

    let body = ReadinessResponse {
        status: if status.is_success() { "UP" } else { "DOWN" }.to_string(),
        upstream,
        watcher,
    };
    (status, Json(body))
}
