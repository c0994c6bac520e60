//! In-memory repos used by unit tests and `AppState::fake`. Enforces the same
//! unique constraints and cascades as the Postgres schema.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    artworks::{
        repo::ArtworkRepo,
        repo_types::{Artwork, NewArtwork},
    },
    error::AppError,
    users::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
};

#[derive(Default)]
struct Tables {
    next_user_id: i64,
    next_artwork_id: i64,
    users: BTreeMap<i64, User>,
    artworks: BTreeMap<i64, Artwork>,
    stars: BTreeSet<(i64, i64)>,
}

impl Tables {
    fn with_stars(&self, mut artwork: Artwork) -> Artwork {
        artwork.stars = self.stars.iter().filter(|(_, a)| *a == artwork.id).count() as i64;
        artwork
    }
}

#[derive(Default)]
pub struct MemStore {
    tables: Mutex<Tables>,
}

impl MemStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn star_pairs(&self) -> Vec<(i64, i64)> {
        self.lock().stars.iter().copied().collect()
    }
}

#[async_trait]
impl UserRepo for MemStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.lock().users.values().cloned().collect())
    }

    async fn create(&self, new: NewUser) -> Result<User, AppError> {
        let mut t = self.lock();
        if t
            .users
            .values()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(AppError::Conflict("record already present".into()));
        }
        t.next_user_id += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: t.next_user_id,
            email: new.email,
            password_hash: new.password_hash,
            username: new.username,
            firstname: new.firstname,
            lastname: new.lastname,
            is_artist: new.is_artist,
            is_curator: new.is_curator,
            is_staff: false,
            is_admin: false,
            address: None,
            social: None,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, AppError> {
        let mut t = self.lock();
        if t
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(AppError::Conflict("record already present".into()));
        }
        let stored = t.users.get_mut(&user.id).ok_or(AppError::NotFound("user"))?;
        let username = stored.username.clone();
        *stored = User {
            username,
            updated_at: OffsetDateTime::now_utc(),
            ..user.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut t = self.lock();
        t.users.remove(&id);
        t.artworks.retain(|_, a| a.owner_id != id);
        let artworks: BTreeSet<i64> = t.artworks.keys().copied().collect();
        t.stars.retain(|(u, a)| *u != id && artworks.contains(a));
        Ok(())
    }
}

#[async_trait]
impl ArtworkRepo for MemStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Artwork>, AppError> {
        let t = self.lock();
        Ok(t.artworks.get(&id).cloned().map(|a| t.with_stars(a)))
    }

    async fn list(&self) -> Result<Vec<Artwork>, AppError> {
        let t = self.lock();
        Ok(t.artworks.values().cloned().map(|a| t.with_stars(a)).collect())
    }

    async fn create(&self, new: NewArtwork) -> Result<Artwork, AppError> {
        let mut t = self.lock();
        if !t.users.contains_key(&new.owner_id) {
            return Err(AppError::Internal(anyhow::anyhow!("owner does not exist")));
        }
        t.next_artwork_id += 1;
        let now = OffsetDateTime::now_utc();
        let artwork = Artwork {
            id: t.next_artwork_id,
            kind: new.kind,
            url: new.url,
            thumbnail: new.thumbnail,
            name: new.name,
            description: new.description,
            views: 0,
            owner_id: new.owner_id,
            public: new.public,
            price: new.price,
            stars: 0,
            created_at: now,
            updated_at: now,
        };
        t.artworks.insert(artwork.id, artwork.clone());
        Ok(artwork)
    }

    async fn save(&self, artwork: &Artwork) -> Result<Artwork, AppError> {
        let mut t = self.lock();
        let stored = t
            .artworks
            .get_mut(&artwork.id)
            .ok_or(AppError::NotFound("artwork"))?;
        *stored = Artwork {
            owner_id: stored.owner_id,
            views: stored.views,
            created_at: stored.created_at,
            updated_at: OffsetDateTime::now_utc(),
            ..artwork.clone()
        };
        let saved = stored.clone();
        Ok(t.with_stars(saved))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut t = self.lock();
        t.artworks.remove(&id);
        t.stars.retain(|(_, a)| *a != id);
        Ok(())
    }

    async fn record_view(&self, id: i64) -> Result<(), AppError> {
        if let Some(a) = self.lock().artworks.get_mut(&id) {
            a.views += 1;
        }
        Ok(())
    }

    async fn star(&self, user_id: i64, artwork_id: i64) -> Result<(), AppError> {
        self.lock().stars.insert((user_id, artwork_id));
        Ok(())
    }

    async fn unstar(&self, user_id: i64, artwork_id: i64) -> Result<(), AppError> {
        self.lock().stars.remove(&(user_id, artwork_id));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Insert a user directly, bypassing the create path so tests can seed staff.
    pub(crate) async fn seed_user(store: &MemStore, username: &str, is_staff: bool) -> User {
        let created = UserRepo::create(
            store,
            NewUser {
                email: format!("{username}@x.com"),
                password_hash: "$argon2id$seeded".into(),
                username: username.into(),
                firstname: String::new(),
                lastname: String::new(),
                is_artist: false,
                is_curator: false,
            },
        )
        .await
        .expect("seed user");
        if !is_staff {
            return created;
        }
        let mut t = store.lock();
        let stored = t.users.get_mut(&created.id).expect("just created");
        stored.is_staff = true;
        stored.clone()
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = MemStore::default();
        seed_user(&store, "amy", false).await;
        let err = UserRepo::create(
            &store,
            NewUser {
                email: "other@x.com".into(),
                password_hash: "h".into(),
                username: "amy".into(),
                firstname: String::new(),
                lastname: String::new(),
                is_artist: false,
                is_curator: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades() {
        let store = MemStore::default();
        let amy = seed_user(&store, "amy", false).await;
        let bob = seed_user(&store, "bob", false).await;
        let art = ArtworkRepo::create(
            &store,
            NewArtwork {
                kind: "print".into(),
                url: String::new(),
                thumbnail: String::new(),
                name: "X".into(),
                description: String::new(),
                owner_id: amy.id,
                public: true,
                price: 1.0,
            },
        )
        .await
        .unwrap();
        store.star(bob.id, art.id).await.unwrap();

        UserRepo::delete(&store, amy.id).await.unwrap();
        assert!(ArtworkRepo::find_by_id(&store, art.id).await.unwrap().is_none());
        assert!(store.star_pairs().is_empty());
    }
}
