use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    claims::SessionClaim,
    dto::{AuthResponse, LoginRequest, RefreshRequest},
    identity,
    jwt::JwtKeys,
};
use crate::{error::AppError, state::AppState, users::{dto::PublicUser, repo_types::User}};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

fn issue_tokens(state: &AppState, user: User) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(&user.username)?;
    let refresh_token = keys.sign_refresh(&user.username)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let username = payload.username.trim();

    let user = match state.users.find_by_username(username).await? {
        Some(u) => u,
        None => {
            state.hasher.verify_absent(&payload.password);
            warn!(username = %username, "login unknown username");
            return Err(AppError::Unauthenticated);
        }
    };

    if !state.hasher.verify(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::Unauthenticated);
    }

    info!(user_id = user.id, username = %user.username, "user logged in");
    issue_tokens(&state, user)
}

/// Trades a refresh token for a new pair. The subject must still exist.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthenticated
    })?;

    let principal = identity::require(state.users.as_ref(), &SessionClaim::from(claims)).await?;
    issue_tokens(&state, principal.into_user())
}
