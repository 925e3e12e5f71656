//! Review API client configuration.

use std::time::Duration;

use reqwest::Url;

use crate::error::ReviewApiError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the HTTP review API client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the remote review API, without trailing slash.
    base_url: Url,

    /// Bearer token sent with every request (optional).
    api_key: Option<String>,

    /// Per-request timeout.
    timeout: Duration,

    /// User agent header value.
    user_agent: String,
}

impl ApiClientConfig {
    /// Creates a new builder for ApiClientConfig.
    pub fn builder() -> ApiClientConfigBuilder {
        ApiClientConfigBuilder::default()
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the API key, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the user agent.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Joins a relative API path onto the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ReviewApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ReviewApiError::InvalidConfig(format!("bad endpoint '{path}': {e}")))
    }
}

/// Builder for ApiClientConfig.
#[derive(Debug, Default)]
pub struct ApiClientConfigBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ApiClientConfigBuilder {
    /// Sets the base URL of the remote API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the base URL is missing, unparsable, or not
    /// http(s), or if the timeout is zero.
    pub fn build(self) -> Result<ApiClientConfig, ReviewApiError> {
        let raw = self
            .base_url
            .ok_or_else(|| ReviewApiError::InvalidConfig("base URL is required".to_string()))?;

        let base_url = Url::parse(raw.trim())
            .map_err(|e| ReviewApiError::InvalidConfig(format!("invalid base URL '{raw}': {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ReviewApiError::InvalidConfig(format!(
                "unsupported scheme '{}'",
                base_url.scheme()
            )));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ReviewApiError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(ApiClientConfig {
            base_url,
            api_key: self.api_key.filter(|k| !k.is_empty()),
            timeout,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| format!("review-gateway/{}", env!("CARGO_PKG_VERSION"))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ApiClientConfig::builder()
            .base_url("https://reviews.example.com/")
            .build()
            .unwrap();

        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.api_key().is_none());
        assert!(config.user_agent().starts_with("review-gateway/"));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ApiClientConfig::builder()
            .base_url("https://reviews.example.com/platform/")
            .build()
            .unwrap();

        let url = config.endpoint("/api/customerReviews/search").unwrap();
        assert_eq!(
            url.as_str(),
            "https://reviews.example.com/platform/api/customerReviews/search"
        );
    }

    #[test]
    fn test_builder_rejects_missing_or_bad_url() {
        assert!(ApiClientConfig::builder().build().is_err());
        assert!(ApiClientConfig::builder().base_url("not a url").build().is_err());
        assert!(
            ApiClientConfig::builder()
                .base_url("ftp://reviews.example.com")
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = ApiClientConfig::builder()
            .base_url("http://localhost:9000")
            .timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(ReviewApiError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let config = ApiClientConfig::builder()
            .base_url("http://localhost:9000")
            .api_key("")
            .build()
            .unwrap();
        assert!(config.api_key().is_none());
    }
}
