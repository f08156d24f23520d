//! Batched call envelope.
//!
//! The HTTP boundary carries a JSON array of [`CallRequest`]s and answers
//! with an array of [`CallResponse`]s. Responses are paired to requests by
//! `id`, never by position; one failing call does not disturb its
//! neighbors.

use serde::{Deserialize, Serialize};

use crate::codec::Payload;
use crate::error::RpcError;

/// A single procedure call within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    /// Caller-chosen identifier echoed back on the response.
    pub id: u64,
    /// Dotted procedure path, e.g. `post.hello`.
    pub path: String,
    /// Input payload. Procedures without input may omit it.
    #[serde(default)]
    pub input: Payload,
}

impl CallRequest {
    pub fn new(id: u64, path: impl Into<String>, input: Payload) -> Self {
        Self {
            id,
            path: path.into(),
            input,
        }
    }
}

/// Outcome of a single call. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl CallResponse {
    /// Create a success response.
    pub fn success(id: u64, result: Payload) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: u64, error: RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Collapse into a plain result. A response carrying neither side is
    /// malformed and surfaces as an internal error.
    pub fn into_result(self) -> Result<Payload, RpcError> {
        match (self.result, self.error) {
            (Some(payload), None) => Ok(payload),
            (_, Some(error)) => Err(error),
            (None, None) => Err(RpcError::internal(
                "Response carried neither result nor error",
            )),
        }
    }
}
