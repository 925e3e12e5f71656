//! Identity of the caller issuing a review request.

use std::fmt;

use crate::types::UserId;

/// The acting storefront user, or anonymous.
///
/// Resolved synchronously at request time. Authentication is handled
/// upstream of this service; the context only carries the identifier.
///
/// # Example
///
/// ```
/// use review_core::UserContext;
///
/// assert!(!UserContext::from_header(None).is_authenticated());
/// assert!(!UserContext::from_header(Some("anonymous")).is_authenticated());
/// assert_eq!(
///     UserContext::from_header(Some(" u-1 ")).user_id().map(|u| u.as_str()),
///     Some("u-1")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum UserContext {
    #[default]
    Anonymous,
    Authenticated(UserId),
}

impl UserContext {
    /// Context for an identified user.
    pub fn authenticated(user_id: impl Into<UserId>) -> Self {
        Self::Authenticated(user_id.into())
    }

    /// Builds the context from a raw header value.
    ///
    /// Missing, blank and `anonymous` values all mean anonymous.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(id) if !id.is_empty() && !id.eq_ignore_ascii_case("anonymous") => {
                Self::authenticated(id)
            },
            _ => Self::Anonymous,
        }
    }

    /// Returns the user id when authenticated.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(id) => Some(id),
        }
    }

    /// Returns true for an identified user.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl fmt::Display for UserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticated(id) => write!(f, "{}", id),
        }
    }
}
