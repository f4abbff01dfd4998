use axum::{Json, extract::State};
use chrono::Utc;
use tracing::info;

use crate::{
    AppState,
    api::models::auth::{LoginRequest, LoginResponse},
    auth::identity,
    errors::Error,
};

/// Exchange a username and password for a bearer token
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, Error> {
    let principal = identity::authenticate(state.store.as_ref(), &state.decoy, &request.username, &request.password).await?;

    let token = state.codec.issue(&principal.username, &principal.roles, Utc::now())?;
    info!(username = %principal.username, "Issued bearer token");

    Ok(Json(LoginResponse { token }))
}
