//! Result types returned by the remote review API.

use review_core::{CustomerReview, ReviewPage, ReviewSearchCriteria};
use serde::{Deserialize, Serialize};

/// Raw search response: one slice of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSearchResult {
    #[serde(default)]
    pub results: Vec<CustomerReview>,

    #[serde(default)]
    pub total_count: u64,
}

impl ReviewSearchResult {
    /// Creates a new search result.
    pub fn new(results: Vec<CustomerReview>, total_count: u64) -> Self {
        Self {
            results,
            total_count,
        }
    }

    /// Converts the raw result into a page for the criteria that produced it.
    pub fn into_page(self, criteria: &ReviewSearchCriteria) -> ReviewPage {
        ReviewPage::new(
            self.results,
            criteria.page_number,
            criteria.page_size,
            self.total_count,
        )
    }
}

/// Aggregated rating of a product. `None` when nobody rated it yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductRating {
    #[serde(default)]
    pub rating: Option<f64>,
}
