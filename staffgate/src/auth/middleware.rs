use crate::{AppState, auth::session::TokenCodec, types::Principal};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

const BEARER_SCHEME: &str = "Bearer";

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` if the header is missing, not valid UTF-8, uses another scheme, or has an empty
/// token. The scheme name is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the request's identity from its headers, or `None` for an anonymous request.
///
/// Invalid tokens are not an error here: they simply yield no identity, and the authorization
/// policy decides what an anonymous caller may do.
pub fn resolve_principal(headers: &HeaderMap, codec: &TokenCodec, now: DateTime<Utc>) -> Option<Principal> {
    let Some(token) = bearer_token(headers) else {
        trace!("No bearer token presented");
        return None;
    };

    match codec.verify(token, now) {
        Ok(claims) => Some(Principal::from(claims)),
        Err(e) => {
            debug!("Ignoring bearer token: {e}");
            None
        }
    }
}

/// Middleware that attaches the caller's [`Principal`] to the request, if one can be resolved.
///
/// Never rejects a request itself; it always continues to the next stage.
pub async fn authenticate_request(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    // Never trust an identity that arrived with the request from outside
    request.extensions_mut().remove::<Principal>();

    if let Some(principal) = resolve_principal(request.headers(), &state.codec, Utc::now()) {
        trace!(username = %principal.username, "Authenticated request");
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}
