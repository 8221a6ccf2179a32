//! HTTP JSON-RPC client backed by `reqwest`.
//!
//! One client is bound to one chain endpoint. There is no retry or
//! circuit-breaking here: a failed call is reported once and left to the
//! caller.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use chainstake_core::error::TransportError;
use chainstake_core::request::{JsonRpcRequest, JsonRpcResponse};
use chainstake_core::transport::RpcTransport;

/// Configuration for `HttpRpcClient`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Per-request timeout in milliseconds. `None` leaves requests unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl HttpClientConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// HTTP JSON-RPC client for a single endpoint.
pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
}

impl HttpRpcClient {
    /// Build a client for the given JSON-RPC endpoint URL.
    ///
    /// No connection is opened until the first request.
    pub fn new(url: impl Into<String>, config: &HttpClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl RpcTransport for HttpRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        tracing::trace!(url = %self.url, method = %req.method, id = %req.id, "sending request");

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(serde_json::from_slice::<JsonRpcResponse>(&body)?)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_network() {
        let client = HttpRpcClient::new("https://rpc.pulsechain.com", &HttpClientConfig::default()).unwrap();
        assert_eq!(client.url(), "https://rpc.pulsechain.com");
    }

    #[test]
    fn timeout_from_config() {
        let cfg = HttpClientConfig {
            request_timeout_ms: Some(1500),
        };
        assert_eq!(cfg.request_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(HttpClientConfig::default().request_timeout(), None);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let client = HttpRpcClient::new(
            "http://127.0.0.1:9",
            &HttpClientConfig {
                request_timeout_ms: Some(500),
            },
        )
        .unwrap();
        let err = client
            .send(JsonRpcRequest::new(1, "eth_blockNumber", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }
}
