use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, Session, User};
use crate::error::RepoError;

/// Post repository.
///
/// The exposed surface mirrors the procedure registry: posts are inserted
/// and read, never updated or deleted.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a new post and return it as stored.
    async fn insert(&self, post: Post) -> Result<Post, RepoError>;

    /// Every post in the store, across all owners.
    async fn find_all(&self) -> Result<Vec<Post>, RepoError>;

    /// The most recent post owned by `owner`, ordered by `created_at`
    /// descending with ties broken by the store's default order.
    async fn find_latest_by_owner(&self, owner: Uuid) -> Result<Option<Post>, RepoError>;
}

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Persist a new user; duplicate emails surface as `RepoError::Constraint`.
    async fn insert(&self, user: User) -> Result<User, RepoError>;
}

/// Session repository - backing store for cookie sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: Session) -> Result<Session, RepoError>;

    async fn find_by_token(&self, token: Uuid) -> Result<Option<Session>, RepoError>;

    /// Remove a session; an unknown token yields `RepoError::NotFound`.
    async fn delete(&self, token: Uuid) -> Result<(), RepoError>;
}
