use axum::{
    extract::FromRequestParts,
    http::{HeaderName, request::Parts},
};
use review_core::UserContext;

/// Header con la identidad del caller.
pub static USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Extractor del usuario actual a partir del header `X-User-Id`.
///
/// La autenticacion la hace el storefront; aqui solo se lee la identidad.
/// Un header ausente, vacio o invalido equivale a anonimo.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(&USER_ID_HEADER)
            .and_then(|v| v.to_str().ok());

        Ok(CurrentUser(UserContext::from_header(value)))
    }
}
