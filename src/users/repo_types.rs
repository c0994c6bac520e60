use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record as stored. Deliberately not `Serialize`; responses go through `PublicUser`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub is_artist: bool,
    pub is_curator: bool,
    pub is_staff: bool,
    pub is_admin: bool,
    pub address: Option<Address>,
    pub social: Option<Social>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub fn is_privileged(&self) -> bool {
        self.is_staff || self.is_admin
    }
}

/// Fields a new user row is created with. Privileged flags are not part of it:
/// every user starts without staff or admin rights.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub is_artist: bool,
    pub is_curator: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Social {
    pub github: String,
    pub ello: String,
    pub website: String,
}

/// Flat row of `users` left-joined with `addresses` and `socials`.
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub is_artist: bool,
    pub is_curator: bool,
    pub is_staff: bool,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub address_user_id: Option<i64>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub social_user_id: Option<i64>,
    pub github: Option<String>,
    pub ello: Option<String>,
    pub website: Option<String>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        let address = r.address_user_id.map(|_| Address {
            line1: r.line1.unwrap_or_default(),
            line2: r.line2.unwrap_or_default(),
            city: r.city.unwrap_or_default(),
            state: r.state.unwrap_or_default(),
        });
        let social = r.social_user_id.map(|_| Social {
            github: r.github.unwrap_or_default(),
            ello: r.ello.unwrap_or_default(),
            website: r.website.unwrap_or_default(),
        });
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            username: r.username,
            firstname: r.firstname,
            lastname: r.lastname,
            is_artist: r.is_artist,
            is_curator: r.is_curator,
            is_staff: r.is_staff,
            is_admin: r.is_admin,
            address,
            social,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
