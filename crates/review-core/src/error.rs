//! Error types for the review gateway.
//!
//! `ReviewError` is the only error that crosses the service boundary:
//! callers of the review operations never see cache or transport types.
//!
//! # Example
//!
//! ```
//! use review_core::{Result, ReviewError};
//!
//! fn rate(value: i32) -> Result<i32> {
//!     if !(1..=5).contains(&value) {
//!         return Err(ReviewError::validation("value", "must be between 1 and 5"));
//!     }
//!     Ok(value)
//! }
//!
//! assert!(rate(3).is_ok());
//! assert!(rate(9).unwrap_err().is_validation_error());
//! ```

use thiserror::Error;

/// Main error type for review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// A request parameter failed validation.
    #[error("Invalid value for '{field}': {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Why it's invalid
        message: String,
    },

    /// The remote review API does not know the requested resource.
    #[error("{resource} not found")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// The remote review API refused the request.
    #[error("Request rejected by review service: {message}")]
    Rejected {
        /// Message returned by the remote service
        message: String,
    },

    /// The remote review API could not be reached or timed out.
    ///
    /// Retrying later may succeed.
    #[error("Review service unavailable: {message}")]
    Unavailable {
        /// Description of the failure
        message: String,
    },

    /// The remote review API failed in a way that retrying won't fix.
    #[error("Review service error: {message}")]
    Upstream {
        /// Description of the failure
        message: String,
    },

    /// Internal error (unexpected condition).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl ReviewError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the failure is transient and the caller may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result type alias for review operations.
pub type Result<T> = std::result::Result<T, ReviewError>;
