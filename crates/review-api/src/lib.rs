//! # Review API Client
//!
//! Client side of the remote customer review service used by the review
//! gateway.
//!
//! ## Features
//!
//! - Async trait-based abstraction over the remote review API
//! - JSON-over-HTTP backend built on `reqwest`
//! - Error classification into transient and permanent failures
//!
//! ## Example
//!
//! ```ignore
//! use review_api::{ApiClientConfig, HttpReviewApi, ReviewApi};
//! use review_core::ReviewSearchCriteria;
//!
//! let config = ApiClientConfig::builder()
//!     .base_url("https://reviews.internal.example.com")
//!     .api_key("secret")
//!     .build()?;
//!
//! let api = HttpReviewApi::new(config)?;
//! let result = api.search(&ReviewSearchCriteria::for_product("p-1")).await?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod result;
pub mod traits;

// Re-exports
pub use config::{ApiClientConfig, ApiClientConfigBuilder};
pub use error::ReviewApiError;
pub use http::HttpReviewApi;
pub use result::{ProductRating, ReviewSearchResult};
pub use traits::ReviewApi;

// Re-export review_core for consumers
pub use review_core;
