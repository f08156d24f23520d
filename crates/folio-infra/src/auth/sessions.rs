//! Session issuing and resolution.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use folio_core::domain::{Session, SessionUser};
use folio_core::error::RepoError;
use folio_core::ports::{SessionRepository, UserRepository};

/// Default session lifetime in days.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// Issues, resolves, and revokes login sessions.
///
/// Sessions are opaque random tokens persisted through the
/// [`SessionRepository`] port. Resolution joins the session row against
/// the user store and projects the public fields only.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
    ttl: TimeDelta,
}

impl SessionManager {
    pub fn new(sessions: Arc<dyn SessionRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self::with_ttl(sessions, users, TimeDelta::days(DEFAULT_SESSION_TTL_DAYS))
    }

    pub fn with_ttl(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        ttl: TimeDelta,
    ) -> Self {
        Self {
            sessions,
            users,
            ttl,
        }
    }

    /// Create and persist a new session for a user.
    pub async fn issue(&self, user_id: Uuid) -> Result<Session, RepoError> {
        let session = Session::issue(user_id, self.ttl);
        self.sessions.insert(session).await
    }

    /// Resolve a session token to its user, if the session is still live.
    ///
    /// Expired sessions resolve to `None` and their rows are dropped on
    /// sight. A token whose user no longer exists also resolves to `None`.
    pub async fn resolve(&self, token: Uuid) -> Result<Option<SessionUser>, RepoError> {
        let Some(session) = self.sessions.find_by_token(token).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            let _ = self.sessions.delete(session.token).await;
            return Ok(None);
        }

        let user = self.users.find_by_id(session.user_id).await?;
        Ok(user.as_ref().map(SessionUser::from))
    }

    /// Delete a session. Revoking an unknown token is a no-op.
    pub async fn revoke(&self, token: Uuid) -> Result<(), RepoError> {
        match self.sessions.delete(token).await {
            Ok(()) | Err(RepoError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemorySessionRepo, InMemoryUserRepo};
    use folio_core::domain::User;
    use folio_core::ports::UserRepository;

    async fn manager_with_user(ttl: TimeDelta) -> (SessionManager, Uuid) {
        let users = Arc::new(InMemoryUserRepo::new());
        let sessions = Arc::new(InMemorySessionRepo::new());

        let user = users
            .insert(User::new(
                "Ada".to_owned(),
                "ada@example.com".to_owned(),
                "hash".to_owned(),
            ))
            .await
            .unwrap();

        (SessionManager::with_ttl(sessions, users, ttl), user.id)
    }

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let (manager, user_id) = manager_with_user(TimeDelta::days(30)).await;

        let session = manager.issue(user_id).await.unwrap();
        let resolved = manager.resolve(session.token).await.unwrap().unwrap();

        assert_eq!(resolved.id, user_id);
        assert_eq!(resolved.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_revoked_session_resolves_to_none() {
        let (manager, user_id) = manager_with_user(TimeDelta::days(30)).await;

        let session = manager.issue(user_id).await.unwrap();
        manager.revoke(session.token).await.unwrap();

        assert!(manager.resolve(session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_ok() {
        let (manager, _) = manager_with_user(TimeDelta::days(30)).await;

        manager.revoke(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_resolves_to_none() {
        let (manager, user_id) = manager_with_user(TimeDelta::milliseconds(-1)).await;

        let session = manager.issue(user_id).await.unwrap();
        assert!(manager.resolve(session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let (manager, _) = manager_with_user(TimeDelta::days(30)).await;

        assert!(manager.resolve(Uuid::new_v4()).await.unwrap().is_none());
    }
}
