//! Application state - shared across all handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::HttpRequest;
use async_trait::async_trait;
use chrono::TimeDelta;
use uuid::Uuid;

use folio_core::domain::SessionUser;
use folio_core::error::RepoError;
use folio_core::ports::{PasswordService, PostRepository, SessionRepository, UserRepository};
use folio_infra::auth::{Argon2PasswordService, SessionManager};
use folio_infra::database::{
    DatabaseConnections, PostgresPostRepository, PostgresSessionRepository,
    PostgresUserRepository,
};
use folio_infra::memory::{InMemoryPostRepo, InMemorySessionRepo, InMemoryUserRepo};
use folio_rpc::{ContextBuilder, Registry, RequestContext, RpcError, SessionResolver};

use crate::api;
use crate::config::AppConfig;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "folio_session";

type Stores = (
    Arc<dyn PostRepository>,
    Arc<dyn UserRepository>,
    Arc<dyn SessionRepository>,
);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub passwords: Arc<dyn PasswordService>,
    pub sessions: SessionManager,
    pub registry: Arc<Registry>,
    context: ContextBuilder,
}

/// Adapts [`SessionManager`] to the resolver seam the RPC layer expects.
struct SessionGate(SessionManager);

#[async_trait]
impl SessionResolver for SessionGate {
    async fn resolve_session(&self, token: Uuid) -> Result<Option<SessionUser>, RepoError> {
        self.0.resolve(token).await
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let (posts, users, sessions): Stores = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let pool = connections.main;
                    (
                        Arc::new(PostgresPostRepository::new(pool.clone())),
                        Arc::new(PostgresUserRepository::new(pool.clone())),
                        Arc::new(PostgresSessionRepository::new(pool)),
                    )
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory stores.",
                        e
                    );
                    in_memory_stores()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running with in-memory stores.");
                in_memory_stores()
            }
        };

        let manager = SessionManager::with_ttl(
            sessions,
            users.clone(),
            TimeDelta::hours(config.session_ttl_hours),
        );

        Self::assemble(posts, users, manager, config.dev_delay)
    }

    /// State backed entirely by in-memory stores, as the endpoint tests
    /// use it.
    #[cfg(test)]
    pub fn in_memory(dev_delay: bool) -> Self {
        let (posts, users, sessions) = in_memory_stores();
        let manager = SessionManager::new(sessions, users.clone());
        Self::assemble(posts, users, manager, dev_delay)
    }

    fn assemble(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        sessions: SessionManager,
        dev_delay: bool,
    ) -> Self {
        let registry = Arc::new(Registry::new(dev_delay).mount(api::post::router()));
        let context = ContextBuilder::new(posts, Arc::new(SessionGate(sessions.clone())));

        tracing::info!(
            "Application state initialized ({} procedures)",
            registry.paths().len()
        );

        Self {
            users,
            passwords: Arc::new(Argon2PasswordService::new()),
            sessions,
            registry,
            context,
        }
    }

    /// Build the per-request context: resolve the session cookie, if any,
    /// and snapshot the request headers.
    pub async fn request_context(&self, req: &HttpRequest) -> Result<RequestContext, RpcError> {
        let token = req
            .cookie(SESSION_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok());

        let headers: BTreeMap<String, String> = req
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        self.context.build(token, headers).await
    }
}

fn in_memory_stores() -> Stores {
    (
        Arc::new(InMemoryPostRepo::new()),
        Arc::new(InMemoryUserRepo::new()),
        Arc::new(InMemorySessionRepo::new()),
    )
}
