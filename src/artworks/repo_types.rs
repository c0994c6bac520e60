use sqlx::FromRow;
use time::OffsetDateTime;

/// Artwork record as stored; `stars` is derived from `user_stars`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Artwork {
    pub id: i64,
    pub kind: String,
    pub url: String,
    pub thumbnail: String,
    pub name: String,
    pub description: String,
    pub views: i64,
    pub owner_id: i64,
    pub public: bool,
    pub price: f64,
    pub stars: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewArtwork {
    pub kind: String,
    pub url: String,
    pub thumbnail: String,
    pub name: String,
    pub description: String,
    pub owner_id: i64,
    pub public: bool,
    pub price: f64,
}
