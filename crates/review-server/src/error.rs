//! HTTP error type.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use review_core::ReviewError;
use serde::Serialize;

/// Error devuelto por los handlers.
#[derive(Debug)]
pub enum AppError {
    /// Error del dominio de reviews
    Review(ReviewError),

    /// Parametros invalidos
    BadRequest(String),

    /// Error interno
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        Self::Review(err)
    }
}

impl AppError {
    /// Status HTTP de este error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Review(err) => match err {
                ReviewError::Validation { .. } => StatusCode::BAD_REQUEST,
                ReviewError::NotFound { .. } => StatusCode::NOT_FOUND,
                ReviewError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ReviewError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ReviewError::Upstream { .. } => StatusCode::BAD_GATEWAY,
                ReviewError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = status.canonical_reason().unwrap_or("Error").to_string();
        let message = match self {
            AppError::Review(err) => err.to_string(),
            AppError::BadRequest(msg) | AppError::Internal(msg) => msg,
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), message = %message, "Request failed");
        }

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_errors_map_to_status() {
        let cases = [
            (ReviewError::validation("value", "bad"), StatusCode::BAD_REQUEST),
            (ReviewError::not_found("review r-1"), StatusCode::NOT_FOUND),
            (
                ReviewError::Rejected {
                    message: "dup".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ReviewError::Unavailable {
                    message: "down".to_string(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ReviewError::internal("oops"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
