use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{
    repo_types::{Address, Social, User},
    services::UserDetail,
};
use crate::artworks::dto::ArtworkResponse;
use crate::policy::RoleChanges;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub is_artist: bool,
    #[serde(default)]
    pub is_curator: bool,
    /// Captured only so the policy can reject it.
    #[serde(flatten)]
    pub roles: RoleChanges,
}

/// Fields a user may change on a profile. No privileged flags here.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub is_artist: Option<bool>,
    pub is_curator: Option<bool>,
    pub address: Option<Address>,
    pub social: Option<Social>,
}

/// Request body for `PUT /users/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub profile: ProfileChanges,
    pub password: Option<String>,
    #[serde(flatten)]
    pub roles: RoleChanges,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub is_artist: bool,
    pub is_curator: bool,
    pub is_staff: bool,
    pub address: Option<Address>,
    pub social: Option<Social>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            firstname: u.firstname,
            lastname: u.lastname,
            is_artist: u.is_artist,
            is_curator: u.is_curator,
            is_staff: u.is_staff,
            address: u.address,
            social: u.social,
            created_at: u.created_at,
        }
    }
}

/// Single-user read: the public record with its visible artworks.
#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub artworks: Vec<ArtworkResponse>,
}

impl From<UserDetail> for UserDetailResponse {
    fn from(d: UserDetail) -> Self {
        Self {
            user: d.user.into(),
            artworks: d.artworks.into_iter().map(ArtworkResponse::from).collect(),
        }
    }
}
