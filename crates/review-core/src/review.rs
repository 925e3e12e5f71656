//! Customer review and paged search result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, ReviewId};

/// A customer review of a catalog product.
///
/// Every field other than the identifiers is optional because the remote
/// review API omits what it does not store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReview {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author_nickname: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,

    /// Star rating, 1 to 5.
    pub value: Option<i32>,
    pub likes_number: Option<i32>,
    pub dislikes_number: Option<i32>,

    /// Whether the requesting user wrote this review.
    ///
    /// Depends on who asks, which is why search results are cached per user.
    pub is_current_user_review: Option<bool>,

    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub modified_by: Option<String>,
}

impl CustomerReview {
    /// Creates a review with only its identifiers set.
    pub fn new(id: impl Into<ReviewId>, product_id: impl Into<ProductId>) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            author_nickname: None,
            content: None,
            is_active: None,
            value: None,
            likes_number: None,
            dislikes_number: None,
            is_current_user_review: None,
            created_date: None,
            modified_date: None,
            created_by: None,
            modified_by: None,
        }
    }
}

/// One page of review search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub items: Vec<CustomerReview>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl ReviewPage {
    /// Creates a page from upstream results.
    pub fn new(items: Vec<CustomerReview>, page_number: u32, page_size: u32, total_count: u64) -> Self {
        Self {
            items,
            page_number,
            page_size,
            total_count,
        }
    }

    /// Creates an empty page.
    pub fn empty(page_number: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), page_number, page_size, 0)
    }

    /// Number of pages needed to show every result.
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    /// Returns true if there are results after this page.
    pub fn has_next_page(&self) -> bool {
        u64::from(self.page_number) < self.page_count()
    }
}
