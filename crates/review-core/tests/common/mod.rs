#![allow(dead_code)]
use review_core::{CustomerReview, ReviewPage};

/// Builds a review fixture for `product` with the given star value.
pub fn review(id: &str, product: &str, value: i32) -> CustomerReview {
    let mut review = CustomerReview::new(id, product);
    review.author_nickname = Some("tester".to_string());
    review.content = Some(format!("review {id}"));
    review.value = Some(value);
    review.is_active = Some(true);
    review
}

/// Returns a page holding `count` reviews of one product.
pub fn page_of(product: &str, count: usize) -> ReviewPage {
    let items = (0..count)
        .map(|i| review(&format!("r-{i}"), product, 1 + (i % 5) as i32))
        .collect::<Vec<_>>();
    let total = items.len() as u64;
    ReviewPage::new(items, 1, 20, total)
}
