//! HTTP transport for batched procedure calls.

use async_trait::async_trait;

use folio_rpc::codec::CodecError;
use folio_rpc::context::SOURCE_HEADER;
use folio_rpc::envelope::{CallRequest, CallResponse};
use folio_rpc::error::RpcError;

/// Client-side failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The batch never reached the registry, or came back unreadable.
    #[error("Transport failed: {0}")]
    Transport(String),

    /// The registry answered with a procedure error.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// A typed value failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Carries batches of calls to the registry and back.
///
/// Calls handed to one `send` ride a single HTTP request; responses pair
/// to requests by id.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, calls: Vec<CallRequest>) -> Result<Vec<CallResponse>, ClientError>;
}

/// Transport over the `/api/rpc` endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    source: String,
}

impl HttpTransport {
    /// `endpoint` is the full URL of the RPC endpoint; `source` names the
    /// caller origin for server-side diagnostics.
    pub fn new(endpoint: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, calls: Vec<CallRequest>) -> Result<Vec<CallResponse>, ClientError> {
        tracing::debug!("Sending batch of {} call(s) to {}", calls.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(SOURCE_HEADER, &self.source)
            .json(&calls)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Transport(format!(
                "Unexpected status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<CallResponse>>()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
