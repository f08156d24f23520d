//! Procedure registry.
//!
//! Procedures are declared on a [`Router`] (one named group per domain
//! area), mounted into a [`Registry`], and addressed by dotted path such
//! as `post.hello`. Every dispatch runs through the middleware chain:
//! timing first, then the authorization gate for protected procedures,
//! then input decoding and the handler itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use folio_core::domain::SessionUser;

use crate::codec::Payload;
use crate::context::RequestContext;
use crate::envelope::{CallRequest, CallResponse};
use crate::error::RpcError;
use crate::middleware::{AuthGate, CallResult, Middleware, Next, TimingMiddleware, compose};

/// Whether a procedure reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

/// Whether a procedure requires an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

type BoxHandler =
    Arc<dyn Fn(RequestContext, Payload) -> BoxFuture<'static, CallResult> + Send + Sync>;

struct Procedure {
    kind: ProcedureKind,
    access: Access,
    handler: BoxHandler,
}

/// Input schema for a procedure: deserialized from the payload, then
/// validated. Schema failures surface as `BAD_REQUEST` with per-field
/// detail.
pub trait ProcedureInput: Sized + Send + 'static {
    fn from_payload(payload: &Payload) -> Result<Self, RpcError>;
}

impl<T> ProcedureInput for T
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    fn from_payload(payload: &Payload) -> Result<Self, RpcError> {
        let value: T = payload
            .decode()
            .map_err(|e| RpcError::bad_request(format!("Invalid input: {e}")))?;
        value.validate().map_err(RpcError::validation)?;
        Ok(value)
    }
}

/// Input for procedures that take none. Accepts any payload, including a
/// missing one, and discards it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoInput;

impl<'de> Deserialize<'de> for NoInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_ignored_any(serde::de::IgnoredAny)?;
        Ok(NoInput)
    }
}

/// Serializes as `null`, matching the empty payload, so both spellings of
/// "no input" produce the same cache key.
impl Serialize for NoInput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_unit()
    }
}

impl Validate for NoInput {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        Ok(())
    }
}

/// A named group of procedures.
pub struct Router {
    namespace: String,
    procedures: HashMap<String, Procedure>,
}

impl Router {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            procedures: HashMap::new(),
        }
    }

    /// Register a public read procedure.
    pub fn public_query<I, O, F, Fut>(self, name: &str, handler: F) -> Self
    where
        I: ProcedureInput,
        O: Serialize + Send + 'static,
        F: Fn(RequestContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.add(name, ProcedureKind::Query, Access::Public, wrap_public(handler))
    }

    /// Register a public write procedure.
    pub fn public_mutation<I, O, F, Fut>(self, name: &str, handler: F) -> Self
    where
        I: ProcedureInput,
        O: Serialize + Send + 'static,
        F: Fn(RequestContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.add(
            name,
            ProcedureKind::Mutation,
            Access::Public,
            wrap_public(handler),
        )
    }

    /// Register a protected read procedure. The handler receives the
    /// authenticated user directly; the authorization stage has already
    /// rejected anonymous calls by the time it runs.
    pub fn protected_query<I, O, F, Fut>(self, name: &str, handler: F) -> Self
    where
        I: ProcedureInput,
        O: Serialize + Send + 'static,
        F: Fn(RequestContext, SessionUser, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.add(
            name,
            ProcedureKind::Query,
            Access::Protected,
            wrap_protected(handler),
        )
    }

    /// Register a protected write procedure.
    pub fn protected_mutation<I, O, F, Fut>(self, name: &str, handler: F) -> Self
    where
        I: ProcedureInput,
        O: Serialize + Send + 'static,
        F: Fn(RequestContext, SessionUser, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.add(
            name,
            ProcedureKind::Mutation,
            Access::Protected,
            wrap_protected(handler),
        )
    }

    fn add(
        mut self,
        name: &str,
        kind: ProcedureKind,
        access: Access,
        handler: BoxHandler,
    ) -> Self {
        let path = format!("{}.{}", self.namespace, name);
        self.procedures.insert(
            path,
            Procedure {
                kind,
                access,
                handler,
            },
        );
        self
    }
}

fn wrap_public<I, O, F, Fut>(handler: F) -> BoxHandler
where
    I: ProcedureInput,
    O: Serialize + Send + 'static,
    F: Fn(RequestContext, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |ctx, payload| {
        let handler = handler.clone();
        Box::pin(async move {
            let input = I::from_payload(&payload)?;
            let output = handler(ctx, input).await?;
            encode_output(&output)
        })
    })
}

fn wrap_protected<I, O, F, Fut>(handler: F) -> BoxHandler
where
    I: ProcedureInput,
    O: Serialize + Send + 'static,
    F: Fn(RequestContext, SessionUser, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(move |ctx, payload| {
        let handler = handler.clone();
        Box::pin(async move {
            // Narrows the session the authorization stage already checked
            let user = ctx.require_user()?.clone();
            let input = I::from_payload(&payload)?;
            let output = handler(ctx, user, input).await?;
            encode_output(&output)
        })
    })
}

fn encode_output<O: Serialize>(output: &O) -> CallResult {
    Payload::encode(output).map_err(|e| RpcError::internal(format!("Failed to encode response: {e}")))
}

/// The procedure registry: named groups flattened into dotted paths,
/// dispatched through the middleware chain.
pub struct Registry {
    procedures: HashMap<String, Procedure>,
    timing: Arc<dyn Middleware>,
    auth_gate: Arc<dyn Middleware>,
}

impl Registry {
    /// Create an empty registry. `dev_delay` enables the timing stage's
    /// artificial latency.
    pub fn new(dev_delay: bool) -> Self {
        Self {
            procedures: HashMap::new(),
            timing: Arc::new(TimingMiddleware::new(dev_delay)),
            auth_gate: Arc::new(AuthGate),
        }
    }

    /// Mount a router's procedures under their dotted paths.
    pub fn mount(mut self, router: Router) -> Self {
        self.procedures.extend(router.procedures);
        self
    }

    /// All registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// The kind of the procedure mounted at `path`, if any.
    pub fn kind_of(&self, path: &str) -> Option<ProcedureKind> {
        self.procedures.get(path).map(|p| p.kind)
    }

    /// Dispatch a single call through the middleware chain.
    pub async fn dispatch(&self, ctx: RequestContext, call: CallRequest) -> CallResponse {
        let Some(procedure) = self.procedures.get(&call.path) else {
            return CallResponse::error(
                call.id,
                RpcError::not_found(format!("No procedure found on path \"{}\"", call.path)),
            );
        };

        let mut stages = vec![Arc::clone(&self.timing)];
        if procedure.access == Access::Protected {
            stages.push(Arc::clone(&self.auth_gate));
        }

        let handler = Arc::clone(&procedure.handler);
        let input = call.input;
        let terminal: Next = Box::new(move |ctx| handler(ctx, input));

        let chain = compose(&stages, call.path.clone(), terminal);
        match chain(ctx).await {
            Ok(payload) => CallResponse::success(call.id, payload),
            Err(error) => CallResponse::error(call.id, error),
        }
    }

    /// Dispatch a batch of calls sequentially against one shared context,
    /// pairing each response to its request by id.
    pub async fn dispatch_batch(
        &self,
        ctx: &RequestContext,
        calls: Vec<CallRequest>,
    ) -> Vec<CallResponse> {
        let mut responses = Vec::with_capacity(calls.len());
        for call in calls {
            responses.push(self.dispatch(ctx.clone(), call).await);
        }
        responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use folio_infra::memory::InMemoryPostRepo;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    #[derive(Debug, Deserialize, Validate)]
    struct EchoInput {
        #[validate(length(min = 1))]
        text: String,
    }

    #[derive(Debug, Serialize)]
    struct EchoOutput {
        echoed: String,
    }

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

    fn echo_registry() -> Registry {
        Registry::new(false).mount(
            Router::new("echo")
                .public_query("say", |_ctx, input: EchoInput| async move {
                    Ok(EchoOutput {
                        echoed: input.text,
                    })
                })
                .public_mutation("shout", |_ctx, input: EchoInput| async move {
                    Ok(EchoOutput {
                        echoed: input.text.to_uppercase(),
                    })
                })
                .protected_query("whoami", |_ctx, user: SessionUser, _input: NoInput| async move {
                    Ok(user.email)
                }),
        )
    }

    fn input(json: serde_json::Value) -> Payload {
        Payload {
            json,
            meta: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_public_query_dispatch() {
        let registry = echo_registry();

        let res = registry
            .dispatch(
                test_ctx(None),
                CallRequest::new(1, "echo.say", input(json!({"text": "hi"}))),
            )
            .await;

        assert_eq!(res.id, 1);
        assert_eq!(res.result.unwrap().json, json!({"echoed": "hi"}));
    }

    #[tokio::test]
    async fn test_public_mutation_dispatch() {
        let registry = echo_registry();

        let res = registry
            .dispatch(
                test_ctx(None),
                CallRequest::new(2, "echo.shout", input(json!({"text": "hi"}))),
            )
            .await;

        assert_eq!(res.result.unwrap().json, json!({"echoed": "HI"}));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let registry = echo_registry();

        let res = registry
            .dispatch(
                test_ctx(None),
                CallRequest::new(1, "echo.missing", Payload::null()),
            )
            .await;

        let err = res.error.unwrap();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("echo.missing"));
    }

    #[tokio::test]
    async fn test_validation_failure_reports_fields() {
        let registry = echo_registry();

        let res = registry
            .dispatch(
                test_ctx(None),
                CallRequest::new(1, "echo.say", input(json!({"text": ""}))),
            )
            .await;

        let err = res.error.unwrap();
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert!(err.field_errors.unwrap().contains_key("text"));
    }

    #[tokio::test]
    async fn test_protected_rejects_anonymous_before_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_inner = calls.clone();

        let registry = Registry::new(false).mount(Router::new("echo").protected_query(
            "whoami",
            move |_ctx, user: SessionUser, _input: NoInput| {
                let calls = calls_inner.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(user.email)
                }
            },
        ));

        let res = registry
            .dispatch(
                test_ctx(None),
                CallRequest::new(1, "echo.whoami", Payload::null()),
            )
            .await;

        assert_eq!(res.error.unwrap().code, ErrorCode::Unauthorized);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_protected_narrows_user_for_handler() {
        let registry = echo_registry();

        let res = registry
            .dispatch(
                test_ctx(Some(test_user())),
                CallRequest::new(1, "echo.whoami", Payload::null()),
            )
            .await;

        assert_eq!(res.result.unwrap().json, json!("ada@example.com"));
    }

    #[tokio::test]
    async fn test_batch_pairs_responses_by_id() {
        let registry = echo_registry();
        let ctx = test_ctx(None);

        let responses = registry
            .dispatch_batch(
                &ctx,
                vec![
                    CallRequest::new(11, "echo.say", input(json!({"text": "a"}))),
                    CallRequest::new(7, "echo.missing", Payload::null()),
                    CallRequest::new(3, "echo.say", input(json!({"text": "b"}))),
                ],
            )
            .await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, 11);
        assert_eq!(responses[1].id, 7);
        assert_eq!(responses[2].id, 3);

        // One bad call fails alone
        assert!(responses[0].error.is_none());
        assert!(responses[1].error.is_some());
        assert!(responses[2].error.is_none());
    }

    #[tokio::test]
    async fn test_paths_and_kinds() {
        let registry = echo_registry();

        assert_eq!(registry.paths(), vec!["echo.say", "echo.shout", "echo.whoami"]);
        assert_eq!(registry.kind_of("echo.say"), Some(ProcedureKind::Query));
        assert_eq!(registry.kind_of("echo.shout"), Some(ProcedureKind::Mutation));
        assert_eq!(registry.kind_of("nope"), None);
    }
}
