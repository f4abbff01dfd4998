//! HTTP request handlers for all API endpoints.
//!
//! Handlers take the caller's identity through [`MaybePrincipal`](crate::auth::current_user::MaybePrincipal)
//! and return [`crate::errors::Result`], so denials and storage failures map to status codes in one
//! place.

pub mod auth;
pub mod employees;

/// Liveness probe
pub async fn healthz() -> &'static str {
    "OK"
}
