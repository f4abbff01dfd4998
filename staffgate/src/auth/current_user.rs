use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::types::Principal;

/// The identity the authentication middleware attached to this request, if any.
///
/// Extraction never fails: an anonymous request yields `MaybePrincipal(None)`. Handlers pass the
/// inner value on to the authorization policy explicitly.
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

impl MaybePrincipal {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybePrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}
