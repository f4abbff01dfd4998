//! Authentication and authorization.
//!
//! Callers log in once with a username and password and receive a signed bearer token. Every later
//! request presents that token in `Authorization: Bearer <token>`; nothing is kept server side.
//!
//! # Request flow
//!
//! 1. [`middleware::authenticate_request`] runs on every request. A valid token becomes a
//!    [`Principal`](crate::types::Principal) stored in the request extensions; a missing or
//!    invalid token leaves the request anonymous. The middleware never rejects.
//! 2. Handlers take the identity with [`current_user::MaybePrincipal`] and hand it, together with
//!    the facts about the target record, to [`permissions::enforce`].
//! 3. The policy either permits, narrows the scope to the caller's own record, or denies.
//!
//! # Modules
//!
//! - [`session`]: Token issuance and verification
//! - [`identity`]: Username/password resolution for the login path
//! - [`middleware`]: Per-request identity resolution
//! - [`current_user`]: Extractor for the resolved identity
//! - [`permissions`]: The authorization policy
//! - [`password`]: Password hashing and verification using Argon2

pub mod current_user;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod session;
