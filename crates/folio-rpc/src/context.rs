//! Per-request context construction.
//!
//! Every procedure handler receives a [`RequestContext`]: the store
//! handle, the resolved session (or its absence), and the inbound request
//! headers. The context is built once per request and threaded explicitly
//! through every call in that request, including in-process calls made
//! while rendering a page.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use folio_core::domain::SessionUser;
use folio_core::error::RepoError;
use folio_core::ports::PostRepository;

use crate::error::RpcError;

/// Request header identifying the caller origin. Diagnostics only, no
/// behavioral branching.
pub const SOURCE_HEADER: &str = "x-trpc-source";

/// Resolves an opaque session token to its user.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve_session(&self, token: Uuid) -> Result<Option<SessionUser>, RepoError>;
}

/// Per-call bundle of store handle, session, and request headers.
#[derive(Clone)]
pub struct RequestContext {
    pub posts: Arc<dyn PostRepository>,
    pub session: Option<SessionUser>,
    /// Inbound headers, lowercased names.
    pub headers: BTreeMap<String, String>,
}

impl RequestContext {
    /// The authenticated user, or `UNAUTHORIZED` if the session is absent.
    pub fn require_user(&self) -> Result<&SessionUser, RpcError> {
        self.session.as_ref().ok_or_else(RpcError::unauthorized)
    }

    /// Caller origin reported by the transport, if any.
    pub fn source(&self) -> Option<&str> {
        self.headers.get(SOURCE_HEADER).map(String::as_str)
    }
}

/// Builds one [`RequestContext`] per inbound request or render pass.
#[derive(Clone)]
pub struct ContextBuilder {
    posts: Arc<dyn PostRepository>,
    sessions: Arc<dyn SessionResolver>,
}

impl ContextBuilder {
    pub fn new(posts: Arc<dyn PostRepository>, sessions: Arc<dyn SessionResolver>) -> Self {
        Self { posts, sessions }
    }

    /// Build the context for one request.
    ///
    /// Call this once per request and reuse the returned context for every
    /// procedure invoked within it. An unknown or expired token yields a
    /// context without a session, not an error; protected procedures
    /// reject it later at the authorization stage.
    pub async fn build(
        &self,
        token: Option<Uuid>,
        headers: BTreeMap<String, String>,
    ) -> Result<RequestContext, RpcError> {
        let session = match token {
            Some(token) => self.sessions.resolve_session(token).await?,
            None => None,
        };

        Ok(RequestContext {
            posts: self.posts.clone(),
            session,
            headers,
        })
    }
}
