use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateUserRequest, PublicUser, UpdateUserRequest, UserDetailResponse},
    services::{self, parse_id},
};
use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/me", get(get_me))
}

/// Registration is open; no token required.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let Json(payload) = payload?;
    let user = services::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = services::list_users(&state, &claim).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserDetailResponse>, AppError> {
    let id = parse_id(&id)?;
    let detail = services::get_user(&state, &claim, id).await?;
    Ok(Json(detail.into()))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
) -> Result<Json<UserDetailResponse>, AppError> {
    let detail = services::get_me(&state, &claim).await?;
    Ok(Json(detail.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let Json(payload) = payload?;
    let id = parse_id(&id)?;
    let user = services::update_user(&state, &claim, id, payload).await?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    services::delete_user(&state, &claim, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
