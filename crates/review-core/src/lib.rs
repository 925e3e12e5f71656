//! Review Core - Domain types for the customer review gateway
//!
//! This crate provides the types shared by the remote API client and the
//! HTTP server: reviews, search criteria, write models and the caller
//! context, plus the domain error type.

pub mod criteria;
pub mod error;
pub mod models;
pub mod review;
pub mod types;
pub mod user;

pub use criteria::ReviewSearchCriteria;
pub use error::{Result, ReviewError};
pub use models::{
    AssessmentRequest, CustomerReviewAssessmentCreateModel, CustomerReviewCreateModel,
    CustomerReviewRequest, CustomerReviewUpdateModel, ReviewAssessment,
};
pub use review::{CustomerReview, ReviewPage};
pub use types::{ProductId, ReviewId, UserId};
pub use user::UserContext;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
