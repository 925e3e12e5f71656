//! Custom axum extractors.

pub mod path;
pub mod user;

pub use path::{ProductPath, ProductReviewPath, UserPath};
pub use user::{CurrentUser, USER_ID_HEADER};
