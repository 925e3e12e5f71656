//! Cache invalidation endpoint handlers.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::extractors::UserPath;
use crate::service::{REVIEW_REGION, UPSTREAM_REGION};
use crate::state::AppState;

/// Response para operaciones de invalidación.
#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    /// Regiones afectadas.
    pub regions: Vec<String>,
    /// Mensaje descriptivo.
    pub message: String,
}

/// DELETE /cache
/// Dispara el token global de todas las regiones.
#[instrument(skip_all)]
pub async fn invalidate_all(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let count = state.client().invalidate_all();

    tracing::info!(count, "All cache regions invalidated");

    Json(InvalidateResponse {
        regions: state.regions().names(),
        message: format!("Invalidated {count} cache regions"),
    })
}

/// DELETE /cache/users/{user_id}
/// Dispara el token de un usuario.
#[instrument(skip_all, fields(user_id = %path.user_id))]
pub async fn invalidate_user(
    State(state): State<AppState>,
    Path(path): Path<UserPath>,
) -> Result<Json<InvalidateResponse>, AppError> {
    path.validate().map_err(AppError::BadRequest)?;

    state.client().invalidate_user(&path.user_id);

    Ok(Json(InvalidateResponse {
        regions: vec![REVIEW_REGION.to_string()],
        message: format!("Invalidated cached searches of user '{}'", path.user_id),
    }))
}

/// POST /cache/upstream-changed
/// Webhook del API remoto: los datos cambiaron fuera de este gateway.
#[instrument(skip_all)]
pub async fn upstream_changed(State(state): State<AppState>) -> Json<InvalidateResponse> {
    state.client().invalidate_upstream();

    Json(InvalidateResponse {
        regions: vec![UPSTREAM_REGION.to_string()],
        message: "Upstream change recorded".to_string(),
    })
}
