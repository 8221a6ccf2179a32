//! The `RpcTransport` trait, the seam between chain clients and the network.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Async JSON-RPC transport bound to one chain endpoint.
///
/// Implementations must be `Send + Sync` and are stored as
/// `Arc<dyn RpcTransport>` inside a session's client pool.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the raw response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Endpoint identifier (URL or name), used in logs.
    fn url(&self) -> &str;

    /// Send `req` and unwrap the `result` member.
    async fn request(&self, req: JsonRpcRequest) -> Result<Value, TransportError> {
        let resp = self.send(req).await?;
        resp.into_result().map_err(TransportError::Rpc)
    }
}
