//! Login-time identity resolution.
//!
//! Checks a username/password pair against the stored employee record and, on success, yields the
//! [`Principal`] a token is issued for. Both failure modes collapse into the same external error so
//! a caller cannot discover which usernames exist. They also cost the same: an unknown username still
//! pays for one Argon2 verification, against a [`DecoyHash`].

use tracing::{debug, instrument};

use crate::{
    auth::password::{self, Argon2Params},
    errors::Error,
    store::EmployeeStore,
    types::Principal,
};

/// Message returned for every login failure
pub const GENERIC_LOGIN_FAILURE: &str = "Invalid username or password";

const DECOY_PASSWORD: &str = "staffgate-decoy-password";

/// A throwaway hash with the same cost as real ones, verified when the username is unknown.
pub struct DecoyHash(String);

impl DecoyHash {
    pub fn new(params: Argon2Params) -> Result<Self, Error> {
        password::hash_string_with_params(DECOY_PASSWORD, Some(params)).map(Self)
    }
}

impl std::fmt::Debug for DecoyHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DecoyHash(..)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    /// No employee with that username
    #[error("unknown user")]
    NotFound,
    /// Password did not match the stored hash
    #[error("bad credential")]
    BadCredential,
    /// Storage or hashing failed; not an authentication outcome
    #[error(transparent)]
    Internal(#[from] Error),
}

impl From<AuthFailure> for Error {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::NotFound | AuthFailure::BadCredential => Error::Unauthenticated {
                message: Some(GENERIC_LOGIN_FAILURE.to_string()),
            },
            AuthFailure::Internal(e) => e,
        }
    }
}

/// Resolve `username` + `password` into a [`Principal`].
#[instrument(skip_all)]
pub async fn authenticate(
    store: &dyn EmployeeStore,
    decoy: &DecoyHash,
    username: &str,
    password: &str,
) -> Result<Principal, AuthFailure> {
    let Some(employee) = store
        .get_by_username(username)
        .await
        .map_err(|e| AuthFailure::Internal(e.into()))?
    else {
        // Result discarded; only the cost matters
        password::verify_blocking(password.to_string(), decoy.0.clone()).await?;
        debug!("Login failed: unknown user");
        return Err(AuthFailure::NotFound);
    };

    let is_valid = password::verify_blocking(password.to_string(), employee.password_hash).await?;
    if !is_valid {
        debug!("Login failed: password mismatch");
        return Err(AuthFailure::BadCredential);
    }

    Ok(Principal {
        username: employee.username,
        roles: employee.roles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::{InMemoryEmployees, StoreError},
        test_utils::{FAST_ARGON2, seed_employee},
        types::{Employee, Role},
    };
    use std::time::{Duration, Instant};

    fn decoy() -> DecoyHash {
        DecoyHash::new(FAST_ARGON2).unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let store = InMemoryEmployees::new();
        seed_employee(&store, "EMP001", "admin", "admin123", &[Role::Admin]).await;

        let principal = authenticate(&store, &decoy(), "admin", "admin123").await.unwrap();
        assert_eq!(principal.username, "admin");
        assert!(principal.is_admin());
    }

    #[tokio::test]
    async fn test_unknown_user_and_bad_password_look_identical() {
        let store = InMemoryEmployees::new();
        seed_employee(&store, "EMP001", "alice", "correct-horse", &[Role::User]).await;

        let unknown = authenticate(&store, &decoy(), "bob", "whatever").await.unwrap_err();
        assert!(matches!(unknown, AuthFailure::NotFound));
        let wrong = authenticate(&store, &decoy(), "alice", "battery-staple").await.unwrap_err();
        assert!(matches!(wrong, AuthFailure::BadCredential));

        let unknown = Error::from(unknown);
        let wrong = Error::from(wrong);
        assert_eq!(unknown.status_code(), wrong.status_code());
        assert_eq!(unknown.user_message(), wrong.user_message());
        assert_eq!(unknown.user_message(), GENERIC_LOGIN_FAILURE);
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_internal() {
        let store = InMemoryEmployees::new();
        store
            .create(Employee {
                id: "EMP001".to_string(),
                username: "alice".to_string(),
                password_hash: "plaintext-oops".to_string(),
                roles: [Role::User].into_iter().collect(),
            })
            .await
            .unwrap();

        let err = Error::from(authenticate(&store, &decoy(), "alice", "plaintext-oops").await.unwrap_err());
        assert_eq!(err.status_code().as_u16(), 500);
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl EmployeeStore for BrokenStore {
        async fn get_by_id(&self, _: &str) -> crate::store::Result<Option<Employee>> {
            Err(StoreError::Other(anyhow::anyhow!("unavailable")))
        }
        async fn get_by_username(&self, _: &str) -> crate::store::Result<Option<Employee>> {
            Err(StoreError::Other(anyhow::anyhow!("unavailable")))
        }
        async fn list(&self) -> crate::store::Result<Vec<Employee>> {
            Err(StoreError::Other(anyhow::anyhow!("unavailable")))
        }
        async fn create(&self, _: Employee) -> crate::store::Result<Employee> {
            Err(StoreError::Other(anyhow::anyhow!("unavailable")))
        }
        async fn create_many(&self, _: Vec<Employee>) -> crate::store::Result<Vec<Employee>> {
            Err(StoreError::Other(anyhow::anyhow!("unavailable")))
        }
        async fn replace(&self, _: &str, _: Employee) -> crate::store::Result<Employee> {
            Err(StoreError::Other(anyhow::anyhow!("unavailable")))
        }
        async fn delete(&self, _: &str) -> crate::store::Result<bool> {
            Err(StoreError::Other(anyhow::anyhow!("unavailable")))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_not_an_auth_failure() {
        let err = Error::from(authenticate(&BrokenStore, &decoy(), "alice", "pw").await.unwrap_err());
        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_unknown_user_still_verifies_a_hash() {
        let store = InMemoryEmployees::new();

        // A decoy that cannot be parsed turns the unknown-user path into an internal error,
        // which only happens if it is actually verified
        let broken = DecoyHash("not-a-phc-string".to_string());
        let err = authenticate(&store, &broken, "nobody", "whatever").await.unwrap_err();
        assert!(matches!(err, AuthFailure::Internal(_)));

        // Even the decoy's own password never logs anyone in
        let err = authenticate(&store, &decoy(), "nobody", DECOY_PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NotFound));
    }

    async fn average_failure(store: &InMemoryEmployees, decoy: &DecoyHash, username: &str) -> Duration {
        let mut total = Duration::ZERO;
        for _ in 0..3 {
            let started = Instant::now();
            assert!(authenticate(store, decoy, username, "bad-password").await.is_err());
            total += started.elapsed();
        }
        total / 3
    }

    #[tokio::test]
    async fn test_unknown_user_costs_as_much_as_wrong_password() {
        let params = Argon2Params::default();
        let store = InMemoryEmployees::new();
        let hash = password::hash_string_with_params("correct-horse", Some(params)).unwrap();
        store
            .create(Employee {
                id: "EMP001".to_string(),
                username: "alice".to_string(),
                password_hash: hash,
                roles: [Role::User].into_iter().collect(),
            })
            .await
            .unwrap();
        let decoy = DecoyHash::new(params).unwrap();

        let unknown = average_failure(&store, &decoy, "nobody").await;
        let wrong = average_failure(&store, &decoy, "alice").await;
        assert!(unknown * 4 >= wrong, "unknown user {unknown:?} vs wrong password {wrong:?}");
    }
}
