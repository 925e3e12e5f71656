//! Error types for the remote review API.

use review_core::ReviewError;

/// Errors that can occur when talking to the remote review API.
#[derive(Debug, thiserror::Error)]
pub enum ReviewApiError {
    /// The requested review or product was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote API rejected the request (bad input, conflict).
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The remote API is not reachable or answered with a server error.
    #[error("review api unavailable: {reason}")]
    Unavailable { reason: String },

    /// A timeout occurred while waiting for the remote API.
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ReviewApiError {
    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }

    /// Maps the transport error onto the domain error exposed to callers.
    ///
    /// Takes a reference because cached failures are shared between every
    /// caller that waited on the same upstream request.
    pub fn to_review_error(&self) -> ReviewError {
        match self {
            Self::NotFound(what) => ReviewError::not_found(what.clone()),
            Self::Rejected { message, .. } => ReviewError::Rejected {
                message: message.clone(),
            },
            Self::Unavailable { .. } | Self::Timeout { .. } => ReviewError::Unavailable {
                message: self.to_string(),
            },
            Self::InvalidResponse(_) => ReviewError::Upstream {
                message: self.to_string(),
            },
            Self::InvalidConfig(_) => ReviewError::internal(self.to_string()),
        }
    }
}

impl From<ReviewApiError> for ReviewError {
    fn from(err: ReviewApiError) -> Self {
        err.to_review_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReviewApiError::NotFound("review r-1".to_string());
        assert_eq!(err.to_string(), "not found: review r-1");

        let err = ReviewApiError::Rejected {
            status: 422,
            message: "value out of range".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "rejected with status 422: value out of range"
        );
    }

    #[test]
    fn test_is_transient() {
        assert!(ReviewApiError::unavailable("connection reset").is_transient());
        assert!(ReviewApiError::Timeout { seconds: 10 }.is_transient());
        assert!(!ReviewApiError::NotFound("x".to_string()).is_transient());
        assert!(!ReviewApiError::InvalidResponse("eof".to_string()).is_transient());
    }

    #[test]
    fn test_domain_mapping() {
        let err: ReviewError = ReviewApiError::Timeout { seconds: 5 }.into();
        assert!(err.is_transient());

        let err: ReviewError = ReviewApiError::NotFound("product p-1".to_string()).into();
        assert!(err.is_not_found());

        let err = ReviewApiError::Rejected {
            status: 400,
            message: "bad".to_string(),
        }
        .to_review_error();
        assert!(matches!(err, ReviewError::Rejected { .. }));
    }
}
