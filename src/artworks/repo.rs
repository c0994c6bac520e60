use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Artwork, NewArtwork};
use crate::error::AppError;

#[async_trait]
pub trait ArtworkRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Artwork>, AppError>;
    async fn list(&self) -> Result<Vec<Artwork>, AppError>;
    async fn create(&self, new: NewArtwork) -> Result<Artwork, AppError>;
    async fn save(&self, artwork: &Artwork) -> Result<Artwork, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    async fn record_view(&self, id: i64) -> Result<(), AppError>;
    /// Insert the (user, artwork) pair; an existing pair is left as is.
    async fn star(&self, user_id: i64, artwork_id: i64) -> Result<(), AppError>;
    async fn unstar(&self, user_id: i64, artwork_id: i64) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgArtworkRepo {
    db: PgPool,
}

impl PgArtworkRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const SELECT_ARTWORK: &str = r#"
    SELECT a.id, a.kind, a.url, a.thumbnail, a.name, a.description, a.views,
           a.owner_id, a.public, a.price, a.created_at, a.updated_at,
           (SELECT COUNT(*) FROM user_stars s WHERE s.artwork_id = a.id) AS stars
      FROM artworks a
"#;

#[async_trait]
impl ArtworkRepo for PgArtworkRepo {
    async fn find_by_id(&self, id: i64) -> Result<Option<Artwork>, AppError> {
        let row = sqlx::query_as::<_, Artwork>(&format!("{SELECT_ARTWORK} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Artwork>, AppError> {
        let rows = sqlx::query_as::<_, Artwork>(&format!("{SELECT_ARTWORK} ORDER BY a.id"))
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn create(&self, new: NewArtwork) -> Result<Artwork, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO artworks (kind, url, thumbnail, name, description, owner_id, public, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&new.kind)
        .bind(&new.url)
        .bind(&new.thumbnail)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.owner_id)
        .bind(new.public)
        .bind(new.price)
        .fetch_one(&self.db)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("artwork"))
    }

    async fn save(&self, artwork: &Artwork) -> Result<Artwork, AppError> {
        // owner_id and views are not written here
        let updated = sqlx::query(
            r#"
            UPDATE artworks
               SET kind = $2, url = $3, thumbnail = $4, name = $5, description = $6,
                   public = $7, price = $8, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(artwork.id)
        .bind(&artwork.kind)
        .bind(&artwork.url)
        .bind(&artwork.thumbnail)
        .bind(&artwork.name)
        .bind(&artwork.description)
        .bind(artwork.public)
        .bind(artwork.price)
        .execute(&self.db)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("artwork"));
        }

        self.find_by_id(artwork.id)
            .await?
            .ok_or(AppError::NotFound("artwork"))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM artworks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn record_view(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE artworks SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn star(&self, user_id: i64, artwork_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_stars (user_id, artwork_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, artwork_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(artwork_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn unstar(&self, user_id: i64, artwork_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_stars WHERE user_id = $1 AND artwork_id = $2")
            .bind(user_id)
            .bind(artwork_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
