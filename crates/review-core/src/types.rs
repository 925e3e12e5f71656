//! Identifier newtypes for reviews, products and users.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Product identifier.
///
/// Reviews and ratings are always scoped to a single catalog product.
///
/// # Example
///
/// ```
/// use review_core::ProductId;
///
/// let product = ProductId::new("8b0ba5f6");
/// assert_eq!(product.as_str(), "8b0ba5f6");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Customer review identifier, assigned by the remote review API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(String);

impl ReviewId {
    /// Creates a new review identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReviewId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ReviewId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Storefront user identifier.
///
/// # Example
///
/// ```
/// use review_core::UserId;
///
/// let user = UserId::new("user-42");
/// assert_eq!(user.to_string(), "user-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ProductId::new("p-1")).unwrap();
        assert_eq!(json, r#""p-1""#);

        let id: ReviewId = serde_json::from_str(r#""r-9""#).unwrap();
        assert_eq!(id.as_str(), "r-9");
    }

    #[test]
    fn product_ids_order_lexicographically() {
        let mut ids = vec![ProductId::new("b"), ProductId::new("a")];
        ids.sort();
        assert_eq!(ids, vec![ProductId::new("a"), ProductId::new("b")]);
    }
}
