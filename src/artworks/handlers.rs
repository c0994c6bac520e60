use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ArtworkFilter, ArtworkResponse, CreateArtworkRequest, UpdateArtworkRequest},
    services,
};
use crate::{
    auth::extractors::AuthUser, error::AppError, state::AppState, users::services::parse_id,
};

pub fn artwork_routes() -> Router<AppState> {
    Router::new()
        .route("/artworks", get(list_artworks).post(create_artwork))
        .route(
            "/artworks/:id",
            get(get_artwork).put(update_artwork).delete(delete_artwork),
        )
        .route("/artworks/:id/star", post(star_artwork).delete(unstar_artwork))
}

#[instrument(skip(state))]
pub async fn list_artworks(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    filter: Result<Query<ArtworkFilter>, QueryRejection>,
) -> Result<Json<Vec<ArtworkResponse>>, AppError> {
    let Query(filter) = filter?;
    let artworks = services::list_artworks(&state, &claim, filter).await?;
    Ok(Json(artworks.into_iter().map(ArtworkResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_artwork(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ArtworkResponse>, AppError> {
    let id = parse_id(&id)?;
    let artwork = services::get_artwork(&state, &claim, id).await?;
    Ok(Json(artwork.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_artwork(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    payload: Result<Json<CreateArtworkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ArtworkResponse>), AppError> {
    let Json(payload) = payload?;
    let artwork = services::create_artwork(&state, &claim, payload).await?;
    Ok((StatusCode::CREATED, Json(artwork.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_artwork(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateArtworkRequest>, JsonRejection>,
) -> Result<Json<ArtworkResponse>, AppError> {
    let Json(payload) = payload?;
    let id = parse_id(&id)?;
    let artwork = services::update_artwork(&state, &claim, id, payload).await?;
    Ok(Json(artwork.into()))
}

#[instrument(skip(state))]
pub async fn delete_artwork(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    services::delete_artwork(&state, &claim, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn star_artwork(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ArtworkResponse>, AppError> {
    let id = parse_id(&id)?;
    let artwork = services::star_artwork(&state, &claim, id).await?;
    Ok(Json(artwork.into()))
}

#[instrument(skip(state))]
pub async fn unstar_artwork(
    State(state): State<AppState>,
    AuthUser(claim): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ArtworkResponse>, AppError> {
    let id = parse_id(&id)?;
    let artwork = services::unstar_artwork(&state, &claim, id).await?;
    Ok(Json(artwork.into()))
}
