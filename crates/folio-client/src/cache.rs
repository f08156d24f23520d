//! Client-side query cache.
//!
//! Results are cached under their [`QueryKey`] and served without a
//! refetch while fresh. An entry is fresh for a fixed window after the
//! fetch that produced it; hydrated entries age from the moment the
//! server captured them, so the window keeps its meaning across the
//! transfer. The cache instance is constructed and passed down
//! explicitly; there is no process-wide singleton.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use folio_rpc::codec::Payload;
use folio_rpc::dehydrate::{DehydratedState, QueryKey, QueryState};
use folio_rpc::envelope::CallRequest;

use crate::transport::{ClientError, Transport};

/// How long a fetched entry is served without refetching.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

enum Entry {
    /// A result is present. `fetched_at` of `None` means already stale.
    Ready {
        data: Payload,
        fetched_at: Option<Instant>,
    },
    /// Hydrated marker for a fetch the server started but did not await.
    Pending,
}

/// Query cache over a [`Transport`].
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    stale_after: Duration,
    entries: Mutex<HashMap<QueryKey, Entry>>,
    next_id: AtomicU64,
}

impl QueryClient {
    /// Cache with the standard staleness window.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_stale_after(transport, DEFAULT_STALE_AFTER)
    }

    /// Cache with an explicit staleness window.
    pub fn with_stale_after(transport: Arc<dyn Transport>, stale_after: Duration) -> Self {
        Self {
            transport,
            stale_after,
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Run a query, serving it from the cache while fresh.
    pub async fn query(&self, path: &str, input: Payload) -> Result<Payload, ClientError> {
        let key = QueryKey::new(path, &input);
        if let Some(data) = self.fresh_data(&key) {
            return Ok(data);
        }

        let data = self.fetch_one(path, input).await?;
        self.store(key, data.clone());
        Ok(data)
    }

    /// Typed wrapper over [`QueryClient::query`].
    pub async fn query_as<I, O>(&self, path: &str, input: &I) -> Result<O, ClientError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let payload = Payload::encode(input)?;
        let result = self.query(path, payload).await?;
        Ok(result.decode()?)
    }

    /// Run a mutation. Mutations never touch the cache; pair with
    /// [`QueryClient::invalidate`] to evict what they made stale.
    pub async fn mutate(&self, path: &str, input: Payload) -> Result<Payload, ClientError> {
        self.fetch_one(path, input).await
    }

    /// Typed wrapper over [`QueryClient::mutate`].
    pub async fn mutate_as<I, O>(&self, path: &str, input: &I) -> Result<O, ClientError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let payload = Payload::encode(input)?;
        let result = self.mutate(path, payload).await?;
        Ok(result.decode()?)
    }

    /// Run several queries as one batch. Fresh entries answer from the
    /// cache; all misses ride a single HTTP request.
    pub async fn query_batch(
        &self,
        requests: Vec<(String, Payload)>,
    ) -> Vec<Result<Payload, ClientError>> {
        let mut slots: Vec<Option<Result<Payload, ClientError>>> =
            Vec::with_capacity(requests.len());
        let mut misses: Vec<(usize, QueryKey, CallRequest)> = Vec::new();

        for (index, (path, input)) in requests.into_iter().enumerate() {
            let key = QueryKey::new(&path, &input);
            if let Some(data) = self.fresh_data(&key) {
                slots.push(Some(Ok(data)));
            } else {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                misses.push((index, key, CallRequest::new(id, path, input)));
                slots.push(None);
            }
        }

        if !misses.is_empty() {
            let calls: Vec<CallRequest> = misses.iter().map(|(_, _, call)| call.clone()).collect();
            match self.transport.send(calls).await {
                Ok(responses) => {
                    for (index, key, call) in misses {
                        let outcome = match responses.iter().find(|r| r.id == call.id) {
                            Some(response) => {
                                response.clone().into_result().map_err(ClientError::from)
                            }
                            None => Err(ClientError::Transport(
                                "Response batch missing call id".to_string(),
                            )),
                        };
                        if let Ok(data) = &outcome {
                            self.store(key, data.clone());
                        }
                        slots[index] = Some(outcome);
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    for (index, _, _) in misses {
                        slots[index] = Some(Err(ClientError::Transport(message.clone())));
                    }
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(ClientError::Transport("Call produced no response".to_string()))
                })
            })
            .collect()
    }

    /// Merge dehydrated server state into the cache.
    ///
    /// Pending markers never replace data already present; the next
    /// `query` for such a key issues the fetch itself.
    pub fn hydrate(&self, state: DehydratedState) {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap();

        for query in state.queries {
            match query.state {
                QueryState::Success { data } => {
                    // Clock skew or an age beyond the monotonic origin
                    // maps to "already stale"
                    let age = (now - query.dehydrated_at).to_std().ok();
                    let fetched_at = age.and_then(|age| Instant::now().checked_sub(age));
                    entries.insert(query.key, Entry::Ready { data, fetched_at });
                }
                QueryState::Pending => {
                    entries.entry(query.key).or_insert(Entry::Pending);
                }
            }
        }
    }

    /// Drop every cached entry in a namespace: `invalidate("post")`
    /// evicts `post.getAll` but not `poster.like`.
    pub fn invalidate(&self, namespace: &str) {
        let prefix = format!("{namespace}.");
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|key, _| key.path != namespace && !key.path.starts_with(&prefix));
    }

    fn fresh_data(&self, key: &QueryKey) -> Option<Payload> {
        let entries = self.entries.lock().unwrap();
        match entries.get(key)? {
            Entry::Ready {
                data,
                fetched_at: Some(at),
            } if at.elapsed() < self.stale_after => Some(data.clone()),
            _ => None,
        }
    }

    fn store(&self, key: QueryKey, data: Payload) {
        self.entries.lock().unwrap().insert(
            key,
            Entry::Ready {
                data,
                fetched_at: Some(Instant::now()),
            },
        );
    }

    async fn fetch_one(&self, path: &str, input: Payload) -> Result<Payload, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let responses = self
            .transport
            .send(vec![CallRequest::new(id, path, input)])
            .await?;

        let response = responses
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ClientError::Transport("Response batch missing call id".to_string()))?;

        Ok(response.into_result()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use folio_rpc::dehydrate::DehydratedQuery;
    use folio_rpc::envelope::CallResponse;
    use folio_rpc::error::RpcError;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::advance;

    struct FakeTransport {
        sends: AtomicUsize,
        served: AtomicUsize,
        fail: bool,
    }

    impl FakeTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sends: AtomicUsize::new(0),
                served: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                sends: AtomicUsize::new(0),
                served: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn sends(&self) -> usize {
            self.sends.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, calls: Vec<CallRequest>) -> Result<Vec<CallResponse>, ClientError> {
            self.sends.fetch_add(1, Ordering::SeqCst);

            Ok(calls
                .iter()
                .map(|call| {
                    if self.fail {
                        return CallResponse::error(call.id, RpcError::internal("down"));
                    }
                    let n = self.served.fetch_add(1, Ordering::SeqCst);
                    CallResponse::success(
                        call.id,
                        Payload {
                            json: json!({"path": call.path, "fetch": n}),
                            meta: Default::default(),
                        },
                    )
                })
                .collect())
        }
    }

    fn success_entry(path: &str, dehydrated_at: chrono::DateTime<Utc>) -> DehydratedQuery {
        DehydratedQuery {
            key: QueryKey::new(path, &Payload::null()),
            state: QueryState::Success {
                data: Payload {
                    json: json!({"hydrated": true}),
                    meta: Default::default(),
                },
            },
            dehydrated_at,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_served_from_cache() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        client.query("post.getAll", Payload::null()).await.unwrap();
        client.query("post.getAll", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 1);

        advance(Duration::from_secs(29)).await;
        client.query("post.getAll", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 1);

        advance(Duration::from_secs(2)).await;
        client.query("post.getAll", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_inputs_cached_separately() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        let a = Payload {
            json: json!({"text": "a"}),
            meta: Default::default(),
        };
        let b = Payload {
            json: json!({"text": "b"}),
            meta: Default::default(),
        };

        client.query("post.hello", a.clone()).await.unwrap();
        client.query("post.hello", b).await.unwrap();
        assert_eq!(transport.sends(), 2);

        client.query("post.hello", a).await.unwrap();
        assert_eq!(transport.sends(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydrated_success_prevents_refetch() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        client.hydrate(DehydratedState {
            queries: vec![success_entry("post.getAll", Utc::now())],
        });

        let result = client.query("post.getAll", Payload::null()).await.unwrap();
        assert_eq!(result.json, json!({"hydrated": true}));
        assert_eq!(transport.sends(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydrated_entry_ages_against_window() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        client.hydrate(DehydratedState {
            queries: vec![success_entry(
                "post.getAll",
                Utc::now() - TimeDelta::seconds(31),
            )],
        });

        client.query("post.getAll", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_hydration_fetches_on_first_use() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        client.hydrate(DehydratedState {
            queries: vec![DehydratedQuery {
                key: QueryKey::new("post.getLatest", &Payload::null()),
                state: QueryState::Pending,
                dehydrated_at: Utc::now(),
            }],
        });

        client
            .query("post.getLatest", Payload::null())
            .await
            .unwrap();
        assert_eq!(transport.sends(), 1);

        client
            .query("post.getLatest", Payload::null())
            .await
            .unwrap();
        assert_eq!(transport.sends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_never_clobbers_cached_data() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        client.query("post.getAll", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 1);

        client.hydrate(DehydratedState {
            queries: vec![DehydratedQuery {
                key: QueryKey::new("post.getAll", &Payload::null()),
                state: QueryState::Pending,
                dehydrated_at: Utc::now(),
            }],
        });

        client.query("post.getAll", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_bypass_the_cache() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        let input = Payload {
            json: json!({"name": "Test"}),
            meta: Default::default(),
        };

        client.mutate("post.create", input.clone()).await.unwrap();
        client.mutate("post.create", input).await.unwrap();
        assert_eq!(transport.sends(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_evicts_namespace_only() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        client.query("post.getAll", Payload::null()).await.unwrap();
        client.query("poster.like", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 2);

        client.invalidate("post");

        client.query("poster.like", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 2);

        client.query("post.getAll", Payload::null()).await.unwrap();
        assert_eq!(transport.sends(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_responses_are_not_cached() {
        let transport = FakeTransport::failing();
        let client = QueryClient::new(transport.clone());

        let err = client
            .query("post.getAll", Payload::null())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));

        client
            .query("post.getAll", Payload::null())
            .await
            .unwrap_err();
        assert_eq!(transport.sends(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_batch_rides_one_request() {
        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        let results = client
            .query_batch(vec![
                ("post.getAll".to_string(), Payload::null()),
                ("post.getLatest".to_string(), Payload::null()),
            ])
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(transport.sends(), 1);

        // Everything fresh now, so the same batch answers from the cache
        let results = client
            .query_batch(vec![
                ("post.getAll".to_string(), Payload::null()),
                ("post.getLatest".to_string(), Payload::null()),
            ])
            .await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(transport.sends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_as_decodes_typed_result() {
        #[derive(Debug, serde::Deserialize)]
        struct FetchInfo {
            path: String,
            fetch: usize,
        }

        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());

        let info: FetchInfo = client
            .query_as("post.getAll", &folio_rpc::NoInput)
            .await
            .unwrap();

        assert_eq!(info.path, "post.getAll");
        assert_eq!(info.fetch, 0);
    }

    // A result rendered in-process on the server must survive the
    // dehydrate/hydrate round trip and answer from the cache without a
    // second fetch.
    #[tokio::test(start_paused = true)]
    async fn test_hydration_bridges_server_render_to_client_cache() {
        use folio_infra::InMemoryPostRepo;
        use folio_rpc::caller::Caller;
        use folio_rpc::context::RequestContext;
        use folio_rpc::registry::{Registry, Router};
        use folio_rpc::{NoInput, RpcError};
        use std::collections::BTreeMap;

        let registry = Arc::new(Registry::new(false).mount(Router::new("post").public_query(
            "getAll",
            |_ctx, _input: NoInput| async move {
                Ok::<_, RpcError>(vec!["first".to_string(), "second".to_string()])
            },
        )));

        let ctx = RequestContext {
            posts: Arc::new(InMemoryPostRepo::new()),
            session: None,
            headers: BTreeMap::new(),
        };

        let caller = Caller::new(registry, ctx);
        let rendered: Vec<String> = caller.query_as("post.getAll", &NoInput).await.unwrap();
        let state = caller.dehydrate().await;

        let transport = FakeTransport::new();
        let client = QueryClient::new(transport.clone());
        client.hydrate(state);

        let hydrated: Vec<String> = client.query_as("post.getAll", &NoInput).await.unwrap();
        assert_eq!(hydrated, rendered);
        assert_eq!(transport.sends(), 0);
    }
}
