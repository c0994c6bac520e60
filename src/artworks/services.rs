use tracing::{info, warn};

use super::{
    dto::{ArtworkFilter, CreateArtworkRequest, UpdateArtworkRequest},
    repo_types::{Artwork, NewArtwork},
};
use crate::{
    auth::{
        claims::SessionClaim,
        identity::{self, Principal},
    },
    error::AppError,
    policy,
    state::AppState,
};

fn require_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    Ok(name.to_string())
}

async fn load(state: &AppState, id: i64) -> Result<Artwork, AppError> {
    state
        .artworks
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("artwork"))
}

/// Artworks the principal may see, optionally narrowed to one owner.
pub(crate) async fn visible_to(
    state: &AppState,
    principal: &Principal,
    owner: Option<i64>,
) -> Result<Vec<Artwork>, AppError> {
    let artworks = state.artworks.list().await?;
    Ok(artworks
        .into_iter()
        .filter(|a| owner.map_or(true, |owner| a.owner_id == owner))
        .filter(|a| policy::can_view_artwork(principal, a))
        .collect())
}

pub async fn list_artworks(
    state: &AppState,
    claim: &SessionClaim,
    filter: ArtworkFilter,
) -> Result<Vec<Artwork>, AppError> {
    let principal = identity::require(state.users.as_ref(), claim).await?;
    visible_to(state, &principal, filter.owner).await
}

/// Each successful read counts as one view.
pub async fn get_artwork(
    state: &AppState,
    claim: &SessionClaim,
    id: i64,
) -> Result<Artwork, AppError> {
    let principal = identity::require(state.users.as_ref(), claim).await?;
    let mut artwork = load(state, id).await?;
    policy::check_artwork_read(&principal, &artwork)?;
    state.artworks.record_view(artwork.id).await?;
    artwork.views += 1;
    Ok(artwork)
}

pub async fn create_artwork(
    state: &AppState,
    claim: &SessionClaim,
    req: CreateArtworkRequest,
) -> Result<Artwork, AppError> {
    let name = require_name(&req.name)?;
    let principal = identity::require(state.users.as_ref(), claim).await?;

    let owner_id = policy::owner_for_new_artwork(&principal);
    if req.owner.is_some_and(|o| o != owner_id) {
        warn!(principal_id = owner_id, requested_owner = ?req.owner, "ignoring owner in artwork body");
    }

    let artwork = state
        .artworks
        .create(NewArtwork {
            kind: req.kind,
            url: req.url,
            thumbnail: req.thumbnail,
            name,
            description: req.description,
            owner_id,
            public: req.public,
            price: req.price,
        })
        .await?;

    info!(artwork_id = artwork.id, owner_id, "artwork created");
    Ok(artwork)
}

pub async fn update_artwork(
    state: &AppState,
    claim: &SessionClaim,
    id: i64,
    req: UpdateArtworkRequest,
) -> Result<Artwork, AppError> {
    let name = req.name.as_deref().map(require_name).transpose()?;
    let principal = identity::require(state.users.as_ref(), claim).await?;
    let mut artwork = load(state, id).await?;

    policy::check_artwork_update(&principal, &artwork, req.owner).map_err(|e| {
        warn!(principal_id = principal.id(), artwork_id = artwork.id, error = %e, "artwork update denied");
        e
    })?;

    if let Some(v) = req.kind {
        artwork.kind = v;
    }
    if let Some(v) = name {
        artwork.name = v;
    }
    if let Some(v) = req.url {
        artwork.url = v;
    }
    if let Some(v) = req.thumbnail {
        artwork.thumbnail = v;
    }
    if let Some(v) = req.description {
        artwork.description = v;
    }
    if let Some(v) = req.public {
        artwork.public = v;
    }
    if let Some(v) = req.price {
        artwork.price = v;
    }

    let saved = state.artworks.save(&artwork).await?;
    info!(principal_id = principal.id(), artwork_id = saved.id, "artwork updated");
    Ok(saved)
}

pub async fn delete_artwork(
    state: &AppState,
    claim: &SessionClaim,
    id: i64,
) -> Result<(), AppError> {
    let principal = identity::require(state.users.as_ref(), claim).await?;
    let artwork = load(state, id).await?;

    policy::check_artwork_delete(&principal, &artwork).map_err(|e| {
        warn!(principal_id = principal.id(), artwork_id = artwork.id, "artwork delete denied");
        e
    })?;

    state.artworks.delete(artwork.id).await?;
    info!(principal_id = principal.id(), artwork_id = artwork.id, "artwork deleted");
    Ok(())
}

pub async fn star_artwork(
    state: &AppState,
    claim: &SessionClaim,
    id: i64,
) -> Result<Artwork, AppError> {
    let principal = identity::require(state.users.as_ref(), claim).await?;
    let artwork = load(state, id).await?;
    policy::check_star(&principal, &artwork)?;
    state.artworks.star(principal.id(), artwork.id).await?;
    load(state, id).await
}

pub async fn unstar_artwork(
    state: &AppState,
    claim: &SessionClaim,
    id: i64,
) -> Result<Artwork, AppError> {
    let principal = identity::require(state.users.as_ref(), claim).await?;
    let artwork = load(state, id).await?;
    policy::check_star(&principal, &artwork)?;
    state.artworks.unstar(principal.id(), artwork.id).await?;
    load(state, id).await
}
