//! # staffgate: Employee directory behind stateless bearer tokens
//!
//! `staffgate` serves a small employee directory over HTTP. Callers log in with a username and
//! password, receive a signed, time-limited token, and present it on every later request. No
//! session state is kept on the server: the token itself carries the caller's username and roles,
//! and an authorization policy decides per request what that caller may do.
//!
//! ## Request Flow
//!
//! 1. `POST /auth/login` checks the credentials against the stored (Argon2-hashed) password and
//!    issues an HS256 token valid for the configured lifetime (one hour by default).
//! 2. Every request passes through [`auth::middleware::authenticate_request`]. A valid token
//!    becomes a [`types::Principal`] in the request extensions. A missing, malformed, forged or
//!    expired token leaves the request anonymous; the middleware itself never rejects.
//! 3. Directory handlers require an authenticated caller holding ADMIN or USER, then ask
//!    [`auth::permissions`] about the specific action and target record.
//!
//! Anonymous callers get `401`; authenticated callers who are denied get a uniform `403` that
//! never says why.
//!
//! ## Authorization Rules
//!
//! - Listing: admins see every record, anyone else sees only their own
//! - Reading one record: the record's owner only, admins included
//! - Creating (single or bulk) and updating: admins only
//! - Deleting: admins only, and never their own record
//!
//! ## Configuration
//!
//! See [`config`]. Without a configured `secret_key` a fresh random signing key is generated at
//! every start, so restarting the process logs everyone out.
//!
//! ## Bootstrap
//!
//! On start the configured admin account is created if it does not exist yet and a password is
//! configured for it. Records live in memory ([`store::InMemoryEmployees`]); any other
//! [`store::EmployeeStore`] can be plugged into [`AppState`].

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod store;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};

pub use config::Config;

use crate::{
    api::handlers,
    auth::{
        identity::DecoyHash,
        middleware::authenticate_request,
        password::{self, Argon2Params},
        session::{SigningKey, TokenCodec},
    },
    config::AdminConfig,
    errors::Error,
    store::{EmployeeStore, InMemoryEmployees},
    types::{Employee, Role},
};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .codec(Arc::new(codec))
///     .decoy(Arc::new(decoy))
///     .store(Arc::new(InMemoryEmployees::new()))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    /// Signs and verifies bearer tokens. Built once per process from a single signing key.
    pub codec: Arc<TokenCodec>,
    /// Verified in place of a stored hash when a login names an unknown user
    pub decoy: Arc<DecoyHash>,
    pub store: Arc<dyn EmployeeStore>,
}

/// Create the initial admin employee if it doesn't exist.
///
/// Does nothing when no admin password is configured or when an employee with the admin username
/// already exists. Returns the created record, if any.
#[instrument(skip_all)]
pub async fn seed_initial_admin(
    store: &dyn EmployeeStore,
    admin: &AdminConfig,
    params: Argon2Params,
) -> Result<Option<Employee>, Error> {
    let Some(admin_password) = admin.password.as_ref() else {
        debug!("No admin password configured, skipping admin seeding");
        return Ok(None);
    };

    if store.get_by_username(&admin.username).await?.is_some() {
        debug!(username = %admin.username, "Admin already exists");
        return Ok(None);
    }

    let password_hash = password::hash_blocking(admin_password.clone(), params).await?;
    let employee = store
        .create(Employee {
            id: admin.employee_id.clone(),
            username: admin.username.clone(),
            password_hash,
            roles: [Role::Admin].into_iter().collect(),
        })
        .await?;

    info!(employee_id = %employee.id, username = %employee.username, "Created initial admin");
    Ok(Some(employee))
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            origins.push(origin.parse::<HeaderValue>()?);
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// The authentication middleware wraps every route, including the login and health endpoints, so
/// an identity is resolved uniformly; only the handlers decide whether one is required.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route("/employees/bulk", post(handlers::employees::create_employees_bulk))
        .route(
            "/employees/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
        .layer(from_fn_with_state(state.clone(), authenticate_request))
        .with_state(state)
        .layer(cors);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
}

impl Application {
    /// Create a new application instance with the admin seeded and the router built
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(bind_address = %config.bind_address(), "Starting staffgate");

        let signing_key = match &config.secret_key {
            Some(secret) => SigningKey::from_secret(secret),
            None => {
                info!("No secret_key configured, generated an ephemeral signing key");
                SigningKey::generate()
            }
        };
        let codec = TokenCodec::new(&signing_key, config.auth.security.jwt_expiry)?;

        let params = config.auth.password.argon2_params();
        let decoy = DecoyHash::new(params)?;

        let store = Arc::new(InMemoryEmployees::new());
        seed_initial_admin(store.as_ref(), &config.admin, params).await?;

        let app_state = AppState::builder()
            .config(config.clone())
            .codec(Arc::new(codec))
            .decoy(Arc::new(decoy))
            .store(store)
            .build();

        let router = build_router(app_state.clone())?;

        Ok(Self { router, app_state, config })
    }

    pub fn state(&self) -> &AppState {
        &self.app_state
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "staffgate listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{FAST_ARGON2, create_test_app, create_test_config};

    #[tokio::test]
    async fn test_seed_initial_admin_is_idempotent() {
        let store = InMemoryEmployees::new();
        let admin = create_test_config().admin;

        let created = seed_initial_admin(&store, &admin, FAST_ARGON2).await.unwrap().unwrap();
        assert_eq!(created.id, "EMP001");
        assert!(created.roles.contains(&Role::Admin));
        assert!(password::verify_string("admin123", &created.password_hash).unwrap());

        assert!(seed_initial_admin(&store, &admin, FAST_ARGON2).await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_skipped_without_password() {
        let store = InMemoryEmployees::new();
        let admin = AdminConfig {
            password: None,
            ..create_test_config().admin
        };

        assert!(seed_initial_admin(&store, &admin, FAST_ARGON2).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_healthz_needs_no_token() {
        let (server, _) = create_test_app().await;
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[tokio::test]
    async fn test_generated_key_still_issues_usable_tokens() {
        let config = Config {
            secret_key: None,
            ..create_test_config()
        };
        let app = Application::new(config).await.unwrap();
        let state = app.state().clone();
        let server = app.into_test_server();

        let response = server
            .post("/auth/login")
            .json(&serde_json::json!({ "username": "admin", "password": "admin123" }))
            .await;
        response.assert_status_ok();
        let token = response.json::<serde_json::Value>()["token"].as_str().unwrap().to_string();
        assert!(state.codec.verify(&token, chrono::Utc::now()).is_ok());
    }

    #[test]
    fn test_cors_layer_from_config() {
        let mut config = create_test_config();
        assert!(create_cors_layer(&config).is_ok());

        config.auth.security.cors.allowed_origins = vec!["https://staff.example.com".to_string()];
        config.auth.security.cors.allow_credentials = true;
        assert!(create_cors_layer(&config).is_ok());

        config.auth.security.cors.allowed_origins = vec!["not a header\nvalue".to_string()];
        assert!(create_cors_layer(&config).is_err());
    }
}
