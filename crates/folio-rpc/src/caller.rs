//! In-process procedure calls for server-rendered pages.
//!
//! A [`Caller`] invokes procedures directly, without the HTTP hop, while
//! passing through the same context and middleware chain the transport
//! uses. Every query it runs is captured for dehydration so the client
//! cache can be seeded with the results.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::codec::Payload;
use crate::context::RequestContext;
use crate::dehydrate::{DehydratedQuery, DehydratedState, QueryKey, QueryState};
use crate::envelope::CallRequest;
use crate::error::RpcError;
use crate::middleware::CallResult;
use crate::registry::Registry;

struct Prefetch {
    key: QueryKey,
    handle: JoinHandle<CallResult>,
}

/// One per render pass, built around that request's context.
pub struct Caller {
    registry: Arc<Registry>,
    ctx: RequestContext,
    recorded: Mutex<Vec<DehydratedQuery>>,
    prefetches: Mutex<Vec<Prefetch>>,
}

impl Caller {
    pub fn new(registry: Arc<Registry>, ctx: RequestContext) -> Self {
        Self {
            registry,
            ctx,
            recorded: Mutex::new(Vec::new()),
            prefetches: Mutex::new(Vec::new()),
        }
    }

    /// Invoke a query and record its result for dehydration.
    pub async fn query(&self, path: &str, input: Payload) -> CallResult {
        let key = QueryKey::new(path, &input);
        let response = self
            .registry
            .dispatch(self.ctx.clone(), CallRequest::new(0, path, input))
            .await;

        let payload = response.into_result()?;
        self.recorded.lock().unwrap().push(DehydratedQuery {
            key,
            state: QueryState::Success {
                data: payload.clone(),
            },
            dehydrated_at: Utc::now(),
        });

        Ok(payload)
    }

    /// Typed wrapper over [`Caller::query`].
    pub async fn query_as<I, O>(&self, path: &str, input: &I) -> Result<O, RpcError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let payload = Payload::encode(input)
            .map_err(|e| RpcError::internal(format!("Failed to encode input: {e}")))?;
        let result = self.query(path, payload).await?;
        result
            .decode()
            .map_err(|e| RpcError::internal(format!("Failed to decode response: {e}")))
    }

    /// Start a query without awaiting it.
    ///
    /// If it finishes before [`Caller::dehydrate`] runs, its result ships
    /// to the client like an awaited query; otherwise the client receives
    /// a pending marker and issues the fetch itself on first use. The
    /// spawned call runs to completion either way.
    pub fn prefetch(&self, path: &str, input: Payload) {
        let key = QueryKey::new(path, &input);
        let registry = Arc::clone(&self.registry);
        let ctx = self.ctx.clone();
        let call = CallRequest::new(0, path, input);

        let handle =
            tokio::spawn(async move { registry.dispatch(ctx, call).await.into_result() });
        self.prefetches.lock().unwrap().push(Prefetch { key, handle });
    }

    /// Capture everything this caller ran into a [`DehydratedState`].
    pub async fn dehydrate(&self) -> DehydratedState {
        let mut queries: Vec<DehydratedQuery> =
            self.recorded.lock().unwrap().drain(..).collect();
        let prefetches: Vec<Prefetch> =
            self.prefetches.lock().unwrap().drain(..).collect();

        for prefetch in prefetches {
            if prefetch.handle.is_finished() {
                match prefetch.handle.await {
                    Ok(Ok(payload)) => queries.push(DehydratedQuery {
                        key: prefetch.key,
                        state: QueryState::Success { data: payload },
                        dehydrated_at: Utc::now(),
                    }),
                    Ok(Err(error)) => {
                        // Not shipped; the client fetch will surface it
                        tracing::debug!(
                            "prefetch {} failed before dehydration: {}",
                            prefetch.key.path,
                            error
                        );
                    }
                    Err(e) => {
                        tracing::error!("prefetch task failed: {e}");
                    }
                }
            } else {
                queries.push(DehydratedQuery {
                    key: prefetch.key,
                    state: QueryState::Pending,
                    dehydrated_at: Utc::now(),
                });
            }
        }

        DehydratedState { queries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{NoInput, Router};
    use folio_core::domain::SessionUser;
    use folio_infra::memory::InMemoryPostRepo;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tokio::sync::Notify;
    use uuid::Uuid;

    fn test_ctx(session: Option<SessionUser>) -> RequestContext {
        RequestContext {
            posts: Arc::new(InMemoryPostRepo::new()),
            session,
            headers: BTreeMap::new(),
        }
    }

    fn test_user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            image: None,
        }
    }

    fn counting_registry() -> Arc<Registry> {
        Arc::new(Registry::new(false).mount(
            Router::new("demo")
                .public_query("answer", |_ctx, _input: NoInput| async move { Ok(42u32) })
                .protected_query("mine", |_ctx, user: SessionUser, _input: NoInput| async move {
                    Ok(user.email)
                }),
        ))
    }

    #[tokio::test]
    async fn test_query_records_for_dehydration() {
        let caller = Caller::new(counting_registry(), test_ctx(None));

        let result = caller.query("demo.answer", Payload::null()).await.unwrap();
        assert_eq!(result.json, json!(42));

        let state = caller.dehydrate().await;
        assert_eq!(state.queries.len(), 1);
        assert_eq!(state.queries[0].key.path, "demo.answer");
        assert!(matches!(state.queries[0].state, QueryState::Success { .. }));
    }

    #[tokio::test]
    async fn test_query_as_decodes_typed_result() {
        let caller = Caller::new(counting_registry(), test_ctx(None));

        let answer: u32 = caller.query_as("demo.answer", &NoInput).await.unwrap();
        assert_eq!(answer, 42);
    }

    #[tokio::test]
    async fn test_failed_query_records_nothing() {
        let caller = Caller::new(counting_registry(), test_ctx(None));

        let err = caller.query("demo.mine", Payload::null()).await.unwrap_err();
        assert_eq!(err.message, "Unauthorized");

        assert!(caller.dehydrate().await.is_empty());
    }

    #[tokio::test]
    async fn test_protected_query_through_shared_chain() {
        let caller = Caller::new(counting_registry(), test_ctx(Some(test_user())));

        let email: String = caller.query_as("demo.mine", &NoInput).await.unwrap();
        assert_eq!(email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_finished_prefetch_dehydrates_as_success() {
        let caller = Caller::new(counting_registry(), test_ctx(None));

        caller.prefetch("demo.answer", Payload::null());
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let state = caller.dehydrate().await;
        assert_eq!(state.queries.len(), 1);
        assert!(matches!(state.queries[0].state, QueryState::Success { .. }));
    }

    #[tokio::test]
    async fn test_unfinished_prefetch_dehydrates_as_pending() {
        let gate = Arc::new(Notify::new());
        let handler_gate = gate.clone();

        let registry = Arc::new(Registry::new(false).mount(Router::new("slow").public_query(
            "wait",
            move |_ctx, _input: NoInput| {
                let gate = handler_gate.clone();
                async move {
                    gate.notified().await;
                    Ok(1u32)
                }
            },
        )));

        let caller = Caller::new(registry, test_ctx(None));
        caller.prefetch("slow.wait", Payload::null());
        tokio::task::yield_now().await;

        let state = caller.dehydrate().await;
        assert_eq!(state.queries.len(), 1);
        assert_eq!(state.queries[0].state, QueryState::Pending);
        assert_eq!(state.queries[0].key.path, "slow.wait");

        gate.notify_waiters();
    }
}
