//! Remote review API trait definition.

use async_trait::async_trait;
use review_core::{AssessmentRequest, CustomerReviewRequest, ProductId, ReviewId, ReviewSearchCriteria};

use crate::error::ReviewApiError;
use crate::result::ReviewSearchResult;

/// The remote service that owns customer reviews.
///
/// This trait abstracts over the transport so the gateway can run against
/// the HTTP backend in production and an in-memory double in tests.
/// Implementations do not retry; a failed call is reported as-is.
///
/// # Implementors
///
/// - `HttpReviewApi` - JSON over HTTP
///
/// # Example
///
/// ```ignore
/// use review_api::{ReviewApi, ReviewSearchResult};
///
/// struct MyApi;
///
/// #[async_trait]
/// impl ReviewApi for MyApi {
///     async fn search(&self, criteria: &ReviewSearchCriteria) -> Result<ReviewSearchResult, ReviewApiError> {
///         Ok(ReviewSearchResult::new(Vec::new(), 0))
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// Searches reviews matching the criteria.
    ///
    /// # Errors
    ///
    /// - `ReviewApiError::Unavailable` / `Timeout` on transport failures
    /// - `ReviewApiError::Rejected` if the criteria are not accepted
    async fn search(
        &self,
        criteria: &ReviewSearchCriteria,
    ) -> Result<ReviewSearchResult, ReviewApiError>;

    /// Returns the aggregated rating of a product, `None` if it has no ratings.
    async fn get_rating(&self, product_id: &ProductId) -> Result<Option<f64>, ReviewApiError>;

    /// Creates or updates reviews. Requests without an id are created.
    async fn upsert(&self, reviews: Vec<CustomerReviewRequest>) -> Result<(), ReviewApiError>;

    /// Deletes reviews by id.
    async fn delete(&self, review_ids: Vec<ReviewId>) -> Result<(), ReviewApiError>;

    /// Records a like or dislike on a review.
    async fn add_assessment(
        &self,
        review_id: &ReviewId,
        assessment: AssessmentRequest,
    ) -> Result<(), ReviewApiError>;

    /// Performs a health check on the remote API.
    async fn health_check(&self) -> Result<(), ReviewApiError> {
        Ok(())
    }

    /// Returns an opaque marker that changes whenever review data changes
    /// upstream, outside of this gateway.
    ///
    /// The default implementation returns `None`, meaning the API does not
    /// expose one and out-of-band changes can only arrive via webhook.
    async fn change_marker(&self) -> Result<Option<String>, ReviewApiError> {
        Ok(None)
    }

    /// Returns the name of this API backend, for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_core::CustomerReview;

    struct MockApi {
        name: String,
    }

    #[async_trait]
    impl ReviewApi for MockApi {
        async fn search(
            &self,
            criteria: &ReviewSearchCriteria,
        ) -> Result<ReviewSearchResult, ReviewApiError> {
            let results = criteria
                .product_ids
                .iter()
                .map(|p| CustomerReview::new(format!("r-{}", p), p.clone()))
                .collect::<Vec<_>>();
            let total = results.len() as u64;
            Ok(ReviewSearchResult::new(results, total))
        }

        async fn get_rating(&self, _product_id: &ProductId) -> Result<Option<f64>, ReviewApiError> {
            Ok(Some(4.0))
        }

        async fn upsert(&self, _reviews: Vec<CustomerReviewRequest>) -> Result<(), ReviewApiError> {
            Ok(())
        }

        async fn delete(&self, _review_ids: Vec<ReviewId>) -> Result<(), ReviewApiError> {
            Ok(())
        }

        async fn add_assessment(
            &self,
            review_id: &ReviewId,
            _assessment: AssessmentRequest,
        ) -> Result<(), ReviewApiError> {
            Err(ReviewApiError::NotFound(review_id.to_string()))
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn mock() -> MockApi {
        MockApi {
            name: "mock".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_search() {
        let criteria = ReviewSearchCriteria::for_product("p-1");
        let result = mock().search(&criteria).await.unwrap();

        assert_eq!(result.total_count, 1);
        assert_eq!(result.results[0].id.as_str(), "r-p-1");
    }

    #[tokio::test]
    async fn test_default_health_and_marker() {
        let api = mock();
        assert!(api.health_check().await.is_ok());
        assert_eq!(api.change_marker().await.unwrap(), None);
        assert_eq!(api.name(), "mock");
    }
}
