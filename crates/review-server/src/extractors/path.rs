use review_core::{ProductId, ReviewId, UserId};
use serde::Deserialize;

/// Extractor para rutas /products/{product_id}/...
#[derive(Debug, Deserialize)]
pub struct ProductPath {
    pub product_id: ProductId,
}

/// Extractor para rutas /products/{product_id}/reviews/{review_id}
#[derive(Debug, Deserialize)]
pub struct ProductReviewPath {
    pub product_id: ProductId,
    pub review_id: ReviewId,
}

/// Extractor para rutas /cache/users/{user_id}
#[derive(Debug, Deserialize)]
pub struct UserPath {
    pub user_id: UserId,
}

impl UserPath {
    /// Valida que el id no este vacio.
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.as_str().trim().is_empty() {
            return Err("User id cannot be empty".to_string());
        }
        Ok(())
    }
}
