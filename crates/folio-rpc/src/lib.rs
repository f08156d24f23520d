//! # Folio RPC
//!
//! The typed procedure layer of the Folio API: a registry of named
//! procedures dispatched through a middleware chain, the per-request
//! context they consume, the wire codec and batched call envelope used by
//! the HTTP transport, and the in-process caller that lets pages run
//! procedures during rendering and hand their results to the client
//! cache.

pub mod caller;
pub mod codec;
pub mod context;
pub mod dehydrate;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod registry;

pub use caller::Caller;
pub use codec::{CodecError, Payload, TypeTag};
pub use context::{ContextBuilder, RequestContext, SOURCE_HEADER, SessionResolver};
pub use dehydrate::{DehydratedQuery, DehydratedState, QueryKey, QueryState};
pub use envelope::{CallRequest, CallResponse};
pub use error::{ErrorCode, RpcError};
pub use middleware::{AuthGate, CallResult, Middleware, TimingMiddleware};
pub use registry::{Access, NoInput, ProcedureInput, ProcedureKind, Registry, Router};
