use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{CreateUserRequest, ProfileChanges, UpdateUserRequest},
    repo_types::{NewUser, User},
};
use crate::{
    artworks::{self, repo_types::Artwork},
    auth::{claims::SessionClaim, identity},
    error::AppError,
    policy,
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(email)
}

pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::validation("Invalid ID: must be numerical"))
}

pub async fn create_user(state: &AppState, req: CreateUserRequest) -> Result<User, AppError> {
    let email = normalize_email(&req.email)?;
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::validation("username is required"));
    }
    if req.password.is_empty() {
        return Err(AppError::validation("password is required"));
    }

    if let Err(e) = policy::check_user_create(&req.roles) {
        warn!(username = %username, "attempt to register privileged user");
        return Err(e);
    }

    let password_hash = state.hasher.hash(&req.password)?;

    let user = state
        .users
        .create(NewUser {
            email,
            password_hash,
            username,
            firstname: req.firstname,
            lastname: req.lastname,
            is_artist: req.is_artist,
            is_curator: req.is_curator,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn list_users(state: &AppState, claim: &SessionClaim) -> Result<Vec<User>, AppError> {
    identity::require(state.users.as_ref(), claim).await?;
    state.users.list().await
}

/// A single-user read: the record plus the artworks it owns that the reader may see.
#[derive(Debug)]
pub struct UserDetail {
    pub user: User,
    pub artworks: Vec<Artwork>,
}

pub async fn get_user(
    state: &AppState,
    claim: &SessionClaim,
    id: i64,
) -> Result<UserDetail, AppError> {
    let principal = identity::require(state.users.as_ref(), claim).await?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let artworks = artworks::services::visible_to(state, &principal, Some(user.id)).await?;
    Ok(UserDetail { user, artworks })
}

pub async fn get_me(state: &AppState, claim: &SessionClaim) -> Result<UserDetail, AppError> {
    let principal = identity::require(state.users.as_ref(), claim).await?;
    let artworks = artworks::services::visible_to(state, &principal, Some(principal.id())).await?;
    Ok(UserDetail {
        user: principal.into_user(),
        artworks,
    })
}

fn apply_profile(user: &mut User, changes: ProfileChanges, email: Option<String>) {
    if let Some(email) = email {
        user.email = email;
    }
    if let Some(v) = changes.firstname {
        user.firstname = v;
    }
    if let Some(v) = changes.lastname {
        user.lastname = v;
    }
    if let Some(v) = changes.is_artist {
        user.is_artist = v;
    }
    if let Some(v) = changes.is_curator {
        user.is_curator = v;
    }
    if let Some(v) = changes.address {
        user.address = Some(v);
    }
    if let Some(v) = changes.social {
        user.social = Some(v);
    }
}

pub async fn update_user(
    state: &AppState,
    claim: &SessionClaim,
    id: i64,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    let email = req
        .profile
        .email
        .as_deref()
        .map(normalize_email)
        .transpose()?;
    if req.password.as_deref() == Some("") {
        return Err(AppError::validation("password must not be empty"));
    }

    let principal = identity::require(state.users.as_ref(), claim).await?;
    let mut target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let grant = policy::check_user_update(&principal, &target, &req.roles).map_err(|e| {
        warn!(principal_id = principal.id(), target_id = target.id, error = %e, "user update denied");
        e
    })?;

    apply_profile(&mut target, req.profile, email);
    if let Some(password) = req.password {
        target.password_hash = state.hasher.hash(&password)?;
    }
    if !grant.is_empty() {
        info!(principal_id = principal.id(), target_id = target.id, grant = ?grant, "role flags changed");
    }
    grant.apply(&mut target);

    let saved = state.users.save(&target).await?;
    info!(principal_id = principal.id(), user_id = saved.id, "user updated");
    Ok(saved)
}

pub async fn delete_user(state: &AppState, claim: &SessionClaim, id: i64) -> Result<(), AppError> {
    let principal = identity::require(state.users.as_ref(), claim).await?;
    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    policy::check_user_delete(&principal, &target).map_err(|e| {
        warn!(principal_id = principal.id(), target_id = target.id, "user delete denied");
        e
    })?;

    state.users.delete(target.id).await?;
    info!(user_id = target.id, "user deleted");
    Ok(())
}
