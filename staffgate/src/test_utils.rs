//! Helpers shared by the unit and HTTP tests.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum_test::TestServer;
use chrono::Utc;

use crate::{
    AppState, Application,
    auth::{
        identity::DecoyHash,
        password::{self, Argon2Params},
        session::{SigningKey, TokenCodec},
    },
    config::{AdminConfig, Config},
    store::{EmployeeStore, InMemoryEmployees},
    types::{Employee, Role},
};

/// Cheap Argon2 parameters so tests don't spend seconds hashing
pub const FAST_ARGON2: Argon2Params = Argon2Params {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

pub const TEST_SECRET_KEY: &str = "test-secret-key-for-testing-only-0123456789";
pub const TEST_ADMIN_PASSWORD: &str = "admin123";

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some(TEST_SECRET_KEY.to_string()),
        admin: AdminConfig {
            employee_id: "EMP001".to_string(),
            username: "admin".to_string(),
            password: Some(TEST_ADMIN_PASSWORD.to_string()),
        },
        ..Default::default()
    };
    config.auth.password.argon2_memory_kib = FAST_ARGON2.memory_kib;
    config.auth.password.argon2_iterations = FAST_ARGON2.iterations;
    config.auth.password.argon2_parallelism = FAST_ARGON2.parallelism;
    config
}

/// State over an empty in-memory store, signing with [`TEST_SECRET_KEY`]
pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let codec = TokenCodec::new(&SigningKey::from_secret(TEST_SECRET_KEY), config.auth.security.jwt_expiry)
        .expect("Failed to create token codec");

    AppState::builder()
        .config(config)
        .codec(Arc::new(codec))
        .decoy(Arc::new(DecoyHash::new(FAST_ARGON2).expect("Failed to build decoy hash")))
        .store(Arc::new(InMemoryEmployees::new()))
        .build()
}

/// Full application with the admin seeded, wrapped in a test server
pub async fn create_test_app() -> (TestServer, AppState) {
    let app = Application::new(create_test_config()).await.expect("Failed to create application");
    let state = app.state().clone();
    (app.into_test_server(), state)
}

pub async fn seed_employee(store: &dyn EmployeeStore, id: &str, username: &str, password: &str, roles: &[Role]) -> Employee {
    let password_hash = password::hash_string_with_params(password, Some(FAST_ARGON2)).expect("Failed to hash password");
    store
        .create(Employee {
            id: id.to_string(),
            username: username.to_string(),
            password_hash,
            roles: roles.iter().copied().collect(),
        })
        .await
        .expect("Failed to seed employee")
}

pub fn issue_token(state: &AppState, username: &str, roles: &[Role]) -> String {
    let roles = roles.iter().copied().collect();
    state.codec.issue(username, &roles, Utc::now()).expect("Failed to issue token")
}

pub fn bearer_for(state: &AppState, username: &str, roles: &[Role]) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", issue_token(state, username, roles))).expect("Invalid header value")
}
