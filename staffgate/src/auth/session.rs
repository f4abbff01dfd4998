//! Bearer token issuance and verification.
//!
//! Tokens are compact HS256 JWTs carrying `{sub, roles, iat, exp}`. They are self-contained:
//! nothing about an issued token is stored server side, so validity is decided entirely by the
//! signature and the expiry. The [`TokenCodec`] is built once at startup from the process
//! [`SigningKey`] and shared read-only between requests.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::prelude::RngExt;
use rand::rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::Error,
    types::{Principal, Role, RoleSet},
};

/// Length in bytes of a generated signing key
const GENERATED_KEY_LEN: usize = 32;

/// Process-wide symmetric signing secret.
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn from_secret(secret: &str) -> Self {
        Self(secret.as_bytes().to_vec())
    }

    /// Generate a fresh random key. Tokens signed with it die with the process.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; GENERATED_KEY_LEN];
        rng().fill(&mut bytes[..]);
        Self(bytes)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // Subject (username)
    pub roles: Vec<Role>, // Roles, in issue order
    pub iat: i64,         // Issued at
    pub exp: i64,         // Expiration time
}

impl Claims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal::new(claims.sub, claims.roles)
    }
}

/// The token was malformed, forged, tampered with or expired.
///
/// Deliberately carries no detail: callers only learn that the token is not valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid credential")]
pub struct InvalidCredential;

impl From<InvalidCredential> for Error {
    fn from(_: InvalidCredential) -> Self {
        Error::Unauthenticated { message: None }
    }
}

/// Issues and verifies signed bearer tokens with a single key and a fixed lifetime.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(key: &SigningKey, ttl: Duration) -> Result<Self, Error> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| Error::Internal {
            operation: format!("convert token lifetime: {e}"),
        })?;
        if ttl <= chrono::Duration::zero() {
            return Err(Error::Internal {
                operation: "create token codec: lifetime must be positive".to_string(),
            });
        }

        // Expiry is checked against the caller-supplied clock below, not the system clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Create a signed token for `username` valid from `now` until `now + ttl`.
    pub fn issue(&self, username: &str, roles: &RoleSet, now: DateTime<Utc>) -> Result<String, Error> {
        let claims = Claims {
            sub: username.to_string(),
            roles: roles.iter().copied().collect(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| Error::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Verify a token's signature and structure, and that it has not expired at `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, InvalidCredential> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(kind = ?e.kind(), "Token rejected");
                InvalidCredential
            })?
            .claims;

        if claims.exp <= claims.iat {
            debug!("Token rejected: expiry not after issue time");
            return Err(InvalidCredential);
        }
        if now.timestamp() > claims.exp {
            debug!("Token rejected: expired");
            return Err(InvalidCredential);
        }

        Ok(claims)
    }
}
