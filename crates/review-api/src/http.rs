//! JSON-over-HTTP implementation of the review API.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use review_core::{
    AssessmentRequest, CustomerReviewRequest, ProductId, ReviewId, ReviewSearchCriteria,
};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::ApiClientConfig;
use crate::error::ReviewApiError;
use crate::result::{ProductRating, ReviewSearchResult};
use crate::traits::ReviewApi;

const REVIEWS_PATH: &str = "api/customerReviews";

#[derive(Debug, Deserialize)]
struct ChangeMarker {
    marker: Option<String>,
}

/// Review API backend that talks to the remote review service over HTTP.
///
/// The client holds a connection pool; clone-free sharing goes through
/// `Arc<dyn ReviewApi>`.
pub struct HttpReviewApi {
    client: Client,
    config: ApiClientConfig,
}

impl HttpReviewApi {
    /// Creates a new client from its configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the underlying HTTP client can't be built
    /// (e.g. TLS backend initialization failure).
    pub fn new(config: ApiClientConfig) -> Result<Self, ReviewApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| ReviewApiError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.config.api_key() {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ReviewApiError> {
        let mut url = self.config.endpoint(REVIEWS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ReviewApiError::InvalidConfig("base URL cannot be a base".to_string()))?
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ReviewApiError> {
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        check_status(response).await
    }

    fn transport_error(&self, err: reqwest::Error) -> ReviewApiError {
        if err.is_timeout() {
            ReviewApiError::Timeout {
                seconds: self.config.timeout().as_secs(),
            }
        } else {
            ReviewApiError::unavailable(err.to_string())
        }
    }
}

async fn check_status(response: Response) -> Result<Response, ReviewApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body
    };

    warn!(status = status.as_u16(), path = %path, "Review API returned an error");

    Err(match status {
        StatusCode::NOT_FOUND => ReviewApiError::NotFound(path),
        s if s.is_client_error() => ReviewApiError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => ReviewApiError::unavailable(format!("status {}: {}", s.as_u16(), message)),
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ReviewApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ReviewApiError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl ReviewApi for HttpReviewApi {
    #[instrument(skip_all, fields(page = criteria.page_number, size = criteria.page_size))]
    async fn search(
        &self,
        criteria: &ReviewSearchCriteria,
    ) -> Result<ReviewSearchResult, ReviewApiError> {
        let url = self.endpoint(&["search"])?;
        let response = self.send(self.request(Method::POST, url).json(criteria)).await?;
        let result: ReviewSearchResult = decode(response).await?;

        debug!(
            returned = result.results.len(),
            total = result.total_count,
            "Review search completed"
        );
        Ok(result)
    }

    #[instrument(skip_all, fields(product_id = %product_id))]
    async fn get_rating(&self, product_id: &ProductId) -> Result<Option<f64>, ReviewApiError> {
        let url = self.endpoint(&["rating", product_id.as_str()])?;
        match self.send(self.request(Method::GET, url)).await {
            Ok(response) => Ok(decode::<ProductRating>(response).await?.rating),
            // Products nobody has rated have no rating resource
            Err(ReviewApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all, fields(count = reviews.len()))]
    async fn upsert(&self, reviews: Vec<CustomerReviewRequest>) -> Result<(), ReviewApiError> {
        let url = self.endpoint(&[])?;
        self.send(self.request(Method::POST, url).json(&reviews))
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(count = review_ids.len()))]
    async fn delete(&self, review_ids: Vec<ReviewId>) -> Result<(), ReviewApiError> {
        let mut url = self.endpoint(&[])?;
        {
            let mut query = url.query_pairs_mut();
            for id in &review_ids {
                query.append_pair("ids", id.as_str());
            }
        }
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(review_id = %review_id))]
    async fn add_assessment(
        &self,
        review_id: &ReviewId,
        assessment: AssessmentRequest,
    ) -> Result<(), ReviewApiError> {
        let url = self.endpoint(&[review_id.as_str(), "assessments"])?;
        self.send(self.request(Method::POST, url).json(&assessment))
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ReviewApiError> {
        let url = self.config.endpoint("api/health")?;
        self.send(self.request(Method::GET, url)).await?;
        Ok(())
    }

    async fn change_marker(&self) -> Result<Option<String>, ReviewApiError> {
        let url = self.endpoint(&["changes"])?;
        match self.send(self.request(Method::GET, url)).await {
            Ok(response) => Ok(decode::<ChangeMarker>(response).await?.marker),
            Err(ReviewApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
