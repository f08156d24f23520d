//! Middleware chain wrapped around every procedure invocation.
//!
//! Stages compose left-to-right into an onion: the first stage sees the
//! call first and its result last. A stage short-circuits the chain by
//! returning an error instead of invoking `next`; stages already entered
//! still observe the failure on the way back out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::BoxFuture;
use rand::Rng;

use crate::codec::Payload;
use crate::context::RequestContext;
use crate::error::RpcError;

/// Result of one procedure call.
pub type CallResult = Result<Payload, RpcError>;

/// The tail of the chain from a stage's point of view.
pub type Next = Box<dyn FnOnce(RequestContext) -> BoxFuture<'static, CallResult> + Send>;

/// One stage of the middleware chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: RequestContext, path: &str, next: Next) -> CallResult;
}

/// Compose stages around a terminal handler, first stage outermost.
pub fn compose(stages: &[Arc<dyn Middleware>], path: String, terminal: Next) -> Next {
    let mut next = terminal;
    for stage in stages.iter().rev() {
        let stage = Arc::clone(stage);
        let path = path.clone();
        let inner = next;
        next = Box::new(move |ctx| {
            Box::pin(async move { stage.handle(ctx, &path, inner).await })
        });
    }
    next
}

/// Timing stage applied to every procedure.
///
/// With `dev_delay` set, an artificial 100-500ms pause runs before the
/// handler, simulating the network latency production traffic sees so
/// latency-sensitive UI bugs show up during local development. Elapsed
/// time is reported whenever the stage unwinds, on success and on
/// failure alike.
pub struct TimingMiddleware {
    dev_delay: bool,
}

impl TimingMiddleware {
    pub fn new(dev_delay: bool) -> Self {
        Self { dev_delay }
    }
}

struct CallTimer {
    path: String,
    start: Instant,
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        tracing::info!(
            "{} took {}ms to execute",
            self.path,
            self.start.elapsed().as_millis()
        );
    }
}

#[async_trait]
impl Middleware for TimingMiddleware {
    async fn handle(&self, ctx: RequestContext, path: &str, next: Next) -> CallResult {
        // Drop reports the elapsed time no matter how the call ends
        let _timer = CallTimer {
            path: path.to_owned(),
            start: Instant::now(),
        };

        if self.dev_delay {
            let wait_ms: u64 = rand::rng().random_range(100..500);
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }

        next(ctx).await
    }
}

/// Authorization stage, applied to protected procedures only.
///
/// Fails the call with `UNAUTHORIZED` before the handler runs when the
/// context carries no session.
pub struct AuthGate;

#[async_trait]
impl Middleware for AuthGate {
    async fn handle(&self, ctx: RequestContext, _path: &str, next: Next) -> CallResult {
        if ctx.session.is_none() {
            return Err(RpcError::unauthorized());
        }
        next(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use folio_core::domain::SessionUser;
    use folio_infra::memory::InMemoryPostRepo;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
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

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn handle(&self, ctx: RequestContext, _path: &str, next: Next) -> CallResult {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:enter", self.label));
            let result = next(ctx).await;
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:exit", self.label));
            result
        }
    }

    #[tokio::test]
    async fn test_stages_compose_left_to_right() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stages: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Recorder {
                label: "outer",
                log: log.clone(),
            }),
            Arc::new(Recorder {
                label: "inner",
                log: log.clone(),
            }),
        ];

        let inner_log = log.clone();
        let terminal: Next = Box::new(move |_ctx| {
            Box::pin(async move {
                inner_log.lock().unwrap().push("handler".to_string());
                Ok(Payload::null())
            })
        });

        let chain = compose(&stages, "test.path".to_string(), terminal);
        chain(test_ctx(None)).await.unwrap();

        let entries = log.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec!["outer:enter", "inner:enter", "handler", "inner:exit", "outer:exit"]
        );
    }

    #[tokio::test]
    async fn test_auth_gate_short_circuits_without_session() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stages: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Recorder {
                label: "timing",
                log: log.clone(),
            }),
            Arc::new(AuthGate),
        ];

        let reached = Arc::new(AtomicBool::new(false));
        let reached_inner = reached.clone();
        let terminal: Next = Box::new(move |_ctx| {
            Box::pin(async move {
                reached_inner.store(true, Ordering::SeqCst);
                Ok(Payload::null())
            })
        });

        let chain = compose(&stages, "post.create".to_string(), terminal);
        let err = chain(test_ctx(None)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert!(!reached.load(Ordering::SeqCst));
        // The stage already entered still unwinds
        let entries = log.lock().unwrap().clone();
        assert_eq!(entries, vec!["timing:enter", "timing:exit"]);
    }

    #[tokio::test]
    async fn test_auth_gate_passes_with_session() {
        let stages: Vec<Arc<dyn Middleware>> = vec![Arc::new(AuthGate)];
        let terminal: Next = Box::new(|_ctx| Box::pin(async { Ok(Payload::null()) }));

        let chain = compose(&stages, "post.create".to_string(), terminal);
        assert!(chain(test_ctx(Some(test_user()))).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timing_stage_passes_result_through() {
        let stages: Vec<Arc<dyn Middleware>> = vec![Arc::new(TimingMiddleware::new(true))];
        let terminal: Next = Box::new(|_ctx| {
            Box::pin(async { Err(RpcError::bad_request("boom")) })
        });

        let chain = compose(&stages, "post.hello".to_string(), terminal);
        let err = chain(test_ctx(None)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(err.message, "boom");
    }
}
