//! Review search criteria.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};
use crate::types::ProductId;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the caller does not send one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filters and paging for a review search.
///
/// Field declaration order is the serialization order, which makes the JSON
/// encoding of a canonical criteria value stable enough to use in cache keys.
///
/// # Example
///
/// ```
/// use review_core::ReviewSearchCriteria;
///
/// let criteria = ReviewSearchCriteria::for_product("p-1").with_page(2, 10);
/// assert_eq!(criteria.skip(), 10);
/// assert_eq!(criteria.take(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewSearchCriteria {
    /// Products whose reviews are searched. Treated as a set.
    pub product_ids: Vec<ProductId>,

    /// Only active (or only inactive) reviews. `None` means both.
    pub is_active: Option<bool>,

    /// Free-text filter on review content.
    pub keyword: Option<String>,

    /// Sort expression understood by the remote API, e.g. `createdDate:desc`.
    pub sort: Option<String>,

    /// 1-based page number.
    pub page_number: u32,

    pub page_size: u32,
}

impl Default for ReviewSearchCriteria {
    fn default() -> Self {
        Self {
            product_ids: Vec::new(),
            is_active: None,
            keyword: None,
            sort: None,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReviewSearchCriteria {
    /// Criteria matching every review, first page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria for the reviews of a single product.
    pub fn for_product(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_ids: vec![product_id.into()],
            ..Self::default()
        }
    }

    /// Sets the page number and size.
    pub fn with_page(mut self, page_number: u32, page_size: u32) -> Self {
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }

    /// Sets the sort expression.
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Sets the keyword filter.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Restricts the search to active reviews.
    pub fn active_only(mut self) -> Self {
        self.is_active = Some(true);
        self
    }

    /// Adds a product to the filter.
    pub fn add_product(&mut self, product_id: impl Into<ProductId>) {
        self.product_ids.push(product_id.into());
    }

    /// Number of results to skip upstream.
    pub fn skip(&self) -> u32 {
        self.page_number.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Number of results to take upstream.
    pub fn take(&self) -> u32 {
        self.page_size
    }

    /// Checks paging bounds.
    pub fn validate(&self) -> Result<()> {
        if self.page_number == 0 {
            return Err(ReviewError::validation("pageNumber", "must be 1 or greater"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ReviewError::validation(
                "pageSize",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(())
    }

    /// Returns the canonical form of these criteria.
    ///
    /// Product ids are sorted and deduplicated, blank strings become `None`
    /// and the keyword is trimmed. Logically equal criteria have equal
    /// canonical forms.
    pub fn canonical(&self) -> Self {
        let mut product_ids = self.product_ids.clone();
        product_ids.sort();
        product_ids.dedup();

        Self {
            product_ids,
            is_active: self.is_active,
            keyword: normalize(self.keyword.as_deref()),
            sort: normalize(self.sort.as_deref()),
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
