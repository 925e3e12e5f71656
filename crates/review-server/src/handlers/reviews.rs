//! Review endpoint handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use review_core::{
    CustomerReviewAssessmentCreateModel, CustomerReviewCreateModel, CustomerReviewUpdateModel,
    ProductId, ReviewPage, ReviewSearchCriteria,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::extractors::{CurrentUser, ProductPath, ProductReviewPath};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub product_id: ProductId,
    pub rating: Option<f64>,
}

/// POST /products/{product_id}/reviews/search
#[instrument(skip_all, fields(product_id = %path.product_id, user = %user))]
pub async fn search_reviews(
    State(state): State<AppState>,
    Path(path): Path<ProductPath>,
    CurrentUser(user): CurrentUser,
    Json(mut criteria): Json<ReviewSearchCriteria>,
) -> Result<Json<ReviewPage>, AppError> {
    criteria.add_product(path.product_id);

    let page = state.client().search_reviews(&user, &criteria).await?;

    tracing::debug!(
        returned = page.items.len(),
        total = page.total_count,
        "Reviews found"
    );
    Ok(Json(page))
}

/// GET /products/{product_id}/rating
#[instrument(skip_all, fields(product_id = %path.product_id))]
pub async fn get_product_rating(
    State(state): State<AppState>,
    Path(path): Path<ProductPath>,
) -> Result<Json<RatingResponse>, AppError> {
    let rating = state.client().get_product_rating(&path.product_id).await?;

    Ok(Json(RatingResponse {
        product_id: path.product_id,
        rating,
    }))
}

/// POST /products/{product_id}/reviews
#[instrument(skip_all, fields(product_id = %path.product_id, user = %user))]
pub async fn create_review(
    State(state): State<AppState>,
    Path(path): Path<ProductPath>,
    CurrentUser(user): CurrentUser,
    Json(model): Json<CustomerReviewCreateModel>,
) -> Result<StatusCode, AppError> {
    state
        .client()
        .create_review(&user, &path.product_id, &model)
        .await?;

    tracing::info!("Review created");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /products/{product_id}/reviews/{review_id}
#[instrument(skip_all, fields(
    product_id = %path.product_id,
    review_id = %path.review_id,
    user = %user
))]
pub async fn update_review(
    State(state): State<AppState>,
    Path(path): Path<ProductReviewPath>,
    CurrentUser(user): CurrentUser,
    Json(model): Json<CustomerReviewUpdateModel>,
) -> Result<StatusCode, AppError> {
    state
        .client()
        .update_review(&user, &path.product_id, &path.review_id, &model)
        .await?;

    tracing::info!("Review updated");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /products/{product_id}/reviews/{review_id}
#[instrument(skip_all, fields(
    product_id = %path.product_id,
    review_id = %path.review_id,
    user = %user
))]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(path): Path<ProductReviewPath>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, AppError> {
    state
        .client()
        .delete_review(&user, &path.product_id, &path.review_id)
        .await?;

    tracing::info!("Review deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /products/{product_id}/reviews/{review_id}/assessments
#[instrument(skip_all, fields(review_id = %path.review_id, user = %user))]
pub async fn create_assessment(
    State(state): State<AppState>,
    Path(path): Path<ProductReviewPath>,
    CurrentUser(user): CurrentUser,
    Json(model): Json<CustomerReviewAssessmentCreateModel>,
) -> Result<StatusCode, AppError> {
    state
        .client()
        .create_assessment(&user, &path.review_id, &model)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
