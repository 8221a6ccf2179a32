//! Error types shared across ChainStake crates.

use thiserror::Error;

use crate::chain::Chain;
use crate::request::JsonRpcError;

/// Errors raised while talking to a chain endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, non-2xx status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the session, pool, cache and sink.
///
/// Lifecycle variants (`PoolClosed`, `SessionClosed`, `SinkClosed`) are
/// returned synchronously to the caller of the violating operation and do not
/// affect the session itself.
#[derive(Debug, Error)]
pub enum StakeError {
    /// Chain identifier is outside the supported set, or was never provisioned.
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    /// Client pool was used after teardown.
    #[error("client pool is closed")]
    PoolClosed,

    /// Operation attempted on a closed session.
    #[error("session is closed")]
    SessionClosed,

    /// Event sink no longer accepts events.
    #[error("event sink is closed")]
    SinkClosed,

    /// A stake entry arrived for a key that never had a retrieval cycle.
    #[error("no aggregation bucket for {address} on {chain}")]
    UnknownKey {
        address: alloy_primitives::Address,
        chain: Chain,
    },

    /// `begin_day` is after `end_day`.
    #[error("invalid day range: {begin}..{end}")]
    InvalidRange { begin: u64, end: u64 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Contract response did not have the expected ABI shape.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_display() {
        let err = TransportError::Rpc(JsonRpcError {
            code: -32000,
            message: "execution reverted".into(),
            data: None,
        });
        assert_eq!(err.to_string(), "RPC error -32000: execution reverted");
    }
}
