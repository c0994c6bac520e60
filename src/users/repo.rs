use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewUser, User, UserRow};
use crate::error::AppError;

/// Persistence contract for users. Lookups return `Option` so a missing row
/// is handled explicitly by the caller; uniqueness violations come back as
/// `AppError::Conflict`.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn create(&self, new: NewUser) -> Result<User, AppError>;
    async fn save(&self, user: &User) -> Result<User, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const SELECT_USER: &str = r#"
    SELECT u.id, u.email, u.password_hash, u.username, u.firstname, u.lastname,
           u.is_artist, u.is_curator, u.is_staff, u.is_admin, u.created_at, u.updated_at,
           a.user_id AS address_user_id, a.line1, a.line2, a.city, a.state,
           s.user_id AS social_user_id, s.github, s.ello, s.website
      FROM users u
      LEFT JOIN addresses a ON a.user_id = u.id
      LEFT JOIN socials s ON s.user_id = u.id
"#;

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} ORDER BY u.id"))
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create(&self, new: NewUser) -> Result<User, AppError> {
        // Unique constraints on username and email turn a duplicate into Conflict.
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, password_hash, username, firstname, lastname,
                               is_artist, is_curator)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.username)
        .bind(&new.firstname)
        .bind(&new.lastname)
        .bind(new.is_artist)
        .bind(new.is_curator)
        .fetch_one(&self.db)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    async fn save(&self, user: &User) -> Result<User, AppError> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users
               SET email = $2, password_hash = $3, firstname = $4, lastname = $5,
                   is_artist = $6, is_curator = $7, is_staff = $8, is_admin = $9,
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(user.is_artist)
        .bind(user.is_curator)
        .bind(user.is_staff)
        .bind(user.is_admin)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("user"));
        }

        match &user.address {
            Some(a) => {
                sqlx::query(
                    r#"
                    INSERT INTO addresses (user_id, line1, line2, city, state)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (user_id) DO UPDATE
                       SET line1 = EXCLUDED.line1, line2 = EXCLUDED.line2,
                           city = EXCLUDED.city, state = EXCLUDED.state
                    "#,
                )
                .bind(user.id)
                .bind(&a.line1)
                .bind(&a.line2)
                .bind(&a.city)
                .bind(&a.state)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM addresses WHERE user_id = $1")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        match &user.social {
            Some(s) => {
                sqlx::query(
                    r#"
                    INSERT INTO socials (user_id, github, ello, website)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (user_id) DO UPDATE
                       SET github = EXCLUDED.github, ello = EXCLUDED.ello,
                           website = EXCLUDED.website
                    "#,
                )
                .bind(user.id)
                .bind(&s.github)
                .bind(&s.ello)
                .bind(&s.website)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM socials WHERE user_id = $1")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        self.find_by_id(user.id)
            .await?
            .ok_or(AppError::NotFound("user"))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        // addresses, socials, artworks and stars go with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
