use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Artwork;

#[derive(Debug, Deserialize)]
pub struct CreateArtworkRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub price: f64,
    /// Accepted for compatibility and ignored: the creator always owns the artwork.
    #[serde(default)]
    pub owner: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArtworkRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub public: Option<bool>,
    pub price: Option<f64>,
    pub owner: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtworkFilter {
    pub owner: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ArtworkResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub thumbnail: String,
    pub name: String,
    pub description: String,
    pub views: i64,
    pub owner: i64,
    pub public: bool,
    pub price: f64,
    pub stars: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Artwork> for ArtworkResponse {
    fn from(a: Artwork) -> Self {
        Self {
            id: a.id,
            kind: a.kind,
            url: a.url,
            thumbnail: a.thumbnail,
            name: a.name,
            description: a.description,
            views: a.views,
            owner: a.owner_id,
            public: a.public,
            price: a.price,
            stars: a.stars,
            created_at: a.created_at,
        }
    }
}
