//! In-memory review API double with call counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use review_api::{ReviewApi, ReviewApiError, ReviewSearchResult};
use review_core::{
    AssessmentRequest, CustomerReview, CustomerReviewRequest, ProductId, ReviewAssessment,
    ReviewId, ReviewSearchCriteria,
};

/// Fallo que el mock devuelve mientras este configurado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unavailable,
    Rejected,
    NotFound,
}

impl Failure {
    fn to_error(self) -> ReviewApiError {
        match self {
            Failure::Unavailable => ReviewApiError::unavailable("mock is down"),
            Failure::Rejected => ReviewApiError::Rejected {
                status: 422,
                message: "mock rejected the request".to_string(),
            },
            Failure::NotFound => ReviewApiError::NotFound("mock resource".to_string()),
        }
    }
}

/// API remoto en memoria.
///
/// El rating de un producto es el promedio de los `value` de sus reviews.
#[derive(Default)]
pub struct MockReviewApi {
    reviews: Mutex<Vec<CustomerReview>>,
    next_id: AtomicUsize,
    latency: Mutex<Duration>,
    failure: Mutex<Option<Failure>>,
    marker: Mutex<Option<String>>,
    unhealthy: AtomicBool,

    pub search_calls: AtomicUsize,
    pub rating_calls: AtomicUsize,
    pub upsert_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub assessment_calls: AtomicUsize,
}

impl MockReviewApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Agrega una review existente.
    pub fn seed(&self, id: &str, product: &str, author: &str, value: i32) {
        let mut review = CustomerReview::new(id, product);
        review.created_by = Some(author.to_string());
        review.author_nickname = Some(author.to_string());
        review.content = Some(format!("review {id}"));
        review.value = Some(value);
        review.is_active = Some(true);
        review.likes_number = Some(0);
        review.dislikes_number = Some(0);
        self.reviews.lock().push(review);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn set_failure(&self, failure: Option<Failure>) {
        *self.failure.lock() = failure;
    }

    pub fn set_marker(&self, marker: &str) {
        *self.marker.lock() = Some(marker.to_string());
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn ratings(&self) -> usize {
        self.rating_calls.load(Ordering::SeqCst)
    }

    pub fn review(&self, id: &str) -> Option<CustomerReview> {
        self.reviews
            .lock()
            .iter()
            .find(|r| r.id.as_str() == id)
            .cloned()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.lock().len()
    }

    async fn simulate(&self) -> Result<(), ReviewApiError> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match *self.failure.lock() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReviewApi for MockReviewApi {
    async fn search(
        &self,
        criteria: &ReviewSearchCriteria,
    ) -> Result<ReviewSearchResult, ReviewApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        let matching: Vec<CustomerReview> = self
            .reviews
            .lock()
            .iter()
            .filter(|r| criteria.product_ids.is_empty() || criteria.product_ids.contains(&r.product_id))
            .filter(|r| criteria.is_active.is_none() || r.is_active == criteria.is_active)
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(criteria.skip() as usize)
            .take(criteria.take() as usize)
            .collect();
        Ok(ReviewSearchResult::new(page, total))
    }

    async fn get_rating(&self, product_id: &ProductId) -> Result<Option<f64>, ReviewApiError> {
        self.rating_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        let values: Vec<f64> = self
            .reviews
            .lock()
            .iter()
            .filter(|r| &r.product_id == product_id)
            .filter_map(|r| r.value.map(f64::from))
            .collect();

        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
    }

    async fn upsert(&self, reviews: Vec<CustomerReviewRequest>) -> Result<(), ReviewApiError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        let mut store = self.reviews.lock();
        for request in reviews {
            match &request.id {
                Some(id) => {
                    let review = store
                        .iter_mut()
                        .find(|r| &r.id == id)
                        .ok_or_else(|| ReviewApiError::NotFound(id.to_string()))?;
                    review.author_nickname = Some(request.author_nickname);
                    review.content = Some(request.content);
                    review.value = Some(request.value);
                    review.modified_by = request.user_id.map(|u| u.to_string());
                },
                None => {
                    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                    let mut review = CustomerReview::new(format!("new-{n}"), request.product_id);
                    review.author_nickname = Some(request.author_nickname);
                    review.content = Some(request.content);
                    review.value = Some(request.value);
                    review.is_active = Some(true);
                    review.created_by = request.user_id.map(|u| u.to_string());
                    store.push(review);
                },
            }
        }
        Ok(())
    }

    async fn delete(&self, review_ids: Vec<ReviewId>) -> Result<(), ReviewApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        self.reviews.lock().retain(|r| !review_ids.contains(&r.id));
        Ok(())
    }

    async fn add_assessment(
        &self,
        review_id: &ReviewId,
        assessment: AssessmentRequest,
    ) -> Result<(), ReviewApiError> {
        self.assessment_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        let mut store = self.reviews.lock();
        let review = store
            .iter_mut()
            .find(|r| &r.id == review_id)
            .ok_or_else(|| ReviewApiError::NotFound(review_id.to_string()))?;

        let counter = match assessment.assessment {
            ReviewAssessment::Liked => &mut review.likes_number,
            ReviewAssessment::Disliked => &mut review.dislikes_number,
        };
        *counter = Some(counter.unwrap_or(0) + 1);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ReviewApiError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(ReviewApiError::unavailable("mock is unhealthy"));
        }
        Ok(())
    }

    async fn change_marker(&self) -> Result<Option<String>, ReviewApiError> {
        self.simulate().await?;
        Ok(self.marker.lock().clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
