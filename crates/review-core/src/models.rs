//! Write models sent by the storefront and the requests derived from them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};
use crate::types::{ProductId, ReviewId, UserId};
use crate::user::UserContext;

const MAX_CONTENT_LEN: usize = 4000;

/// Body of a "write a review" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReviewCreateModel {
    pub author_nickname: String,
    pub content: String,
    pub value: i32,
}

/// Body of an "edit my review" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReviewUpdateModel {
    pub author_nickname: String,
    pub content: String,
    pub value: i32,
}

/// A like or dislike on someone's review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewAssessment {
    Liked,
    Disliked,
}

/// Body of a "vote on a review" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReviewAssessmentCreateModel {
    pub assessment: ReviewAssessment,
}

/// Review upsert request understood by the remote review API.
///
/// `id` is `None` when creating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReviewRequest {
    pub id: Option<ReviewId>,
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub author_nickname: String,
    pub content: String,
    pub value: i32,
}

/// Assessment request understood by the remote review API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    pub user_id: Option<UserId>,
    pub assessment: ReviewAssessment,
}

impl CustomerReviewCreateModel {
    /// Validates nickname, content and star value.
    pub fn validate(&self) -> Result<()> {
        validate_review_fields(&self.author_nickname, &self.content, self.value)
    }

    /// Maps the model to an upstream create request.
    pub fn to_request(&self, product_id: &ProductId, user: &UserContext) -> CustomerReviewRequest {
        CustomerReviewRequest {
            id: None,
            product_id: product_id.clone(),
            user_id: user.user_id().cloned(),
            author_nickname: self.author_nickname.trim().to_string(),
            content: self.content.trim().to_string(),
            value: self.value,
        }
    }
}

impl CustomerReviewUpdateModel {
    /// Validates nickname, content and star value.
    pub fn validate(&self) -> Result<()> {
        validate_review_fields(&self.author_nickname, &self.content, self.value)
    }

    /// Maps the model to an upstream update request for `review_id`.
    pub fn to_request(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
        user: &UserContext,
    ) -> CustomerReviewRequest {
        CustomerReviewRequest {
            id: Some(review_id.clone()),
            product_id: product_id.clone(),
            user_id: user.user_id().cloned(),
            author_nickname: self.author_nickname.trim().to_string(),
            content: self.content.trim().to_string(),
            value: self.value,
        }
    }
}

impl CustomerReviewAssessmentCreateModel {
    /// Maps the model to an upstream assessment request.
    pub fn to_request(&self, user: &UserContext) -> AssessmentRequest {
        AssessmentRequest {
            user_id: user.user_id().cloned(),
            assessment: self.assessment,
        }
    }
}

fn validate_review_fields(author_nickname: &str, content: &str, value: i32) -> Result<()> {
    if author_nickname.trim().is_empty() {
        return Err(ReviewError::validation("authorNickname", "cannot be empty"));
    }
    if content.trim().is_empty() {
        return Err(ReviewError::validation("content", "cannot be empty"));
    }
    if content.len() > MAX_CONTENT_LEN {
        return Err(ReviewError::validation(
            "content",
            format!("cannot be longer than {MAX_CONTENT_LEN} bytes"),
        ));
    }
    if !(1..=5).contains(&value) {
        return Err(ReviewError::validation("value", "must be between 1 and 5"));
    }
    Ok(())
}
