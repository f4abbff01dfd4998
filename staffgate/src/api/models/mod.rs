//! API request and response data models.
//!
//! These are distinct from the stored [`Employee`](crate::types::Employee) record: request models
//! carry plaintext passwords that are hashed before anything is stored, and response models never
//! carry a password or hash at all.

pub mod auth;
pub mod employees;
