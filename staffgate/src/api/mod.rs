//! HTTP API: route handlers and their request/response models.
//!
//! - **Authentication** (`/auth/login`): exchange a username and password for a bearer token
//! - **Employees** (`/employees/*`): the directory, guarded by the policy in
//!   [`crate::auth::permissions`]
//! - **Health** (`/healthz`): unauthenticated liveness probe

pub mod handlers;
pub mod models;
