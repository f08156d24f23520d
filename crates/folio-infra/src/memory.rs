//! In-memory repository implementations - used for tests and for running
//! without a database.
//!
//! Note: Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::domain::{Post, Session, User};
use folio_core::error::RepoError;
use folio_core::ports::{PostRepository, SessionRepository, UserRepository};

/// In-memory post store backed by a Vec with async RwLock.
pub struct InMemoryPostRepo {
    store: RwLock<Vec<Post>>,
}

impl InMemoryPostRepo {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryPostRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepo {
    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        store.push(post.clone());
        Ok(post)
    }

    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        let mut posts = store.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn find_latest_by_owner(&self, owner: Uuid) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .iter()
            .filter(|p| p.created_by == owner)
            .max_by_key(|p| p.created_at)
            .cloned())
    }
}

/// In-memory user store keyed by id.
pub struct InMemoryUserRepo {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUserRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        if store.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("User already exists".to_string()));
        }

        store.insert(user.id, user.clone());
        Ok(user)
    }
}

/// In-memory session store keyed by token.
pub struct InMemorySessionRepo {
    store: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionRepo {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepo {
    async fn insert(&self, session: Session) -> Result<Session, RepoError> {
        let mut store = self.store.write().await;
        store.insert(session.token, session.clone());
        Ok(session)
    }

    async fn find_by_token(&self, token: Uuid) -> Result<Option<Session>, RepoError> {
        let store = self.store.read().await;
        Ok(store.get(&token).cloned())
    }

    async fn delete(&self, token: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        if store.remove(&token).is_none() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
