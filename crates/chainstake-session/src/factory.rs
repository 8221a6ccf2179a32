//! Construction of per-chain transports.

use std::sync::Arc;

use chainstake_core::chain::{Chain, ChainEndpoint};
use chainstake_core::error::StakeError;
use chainstake_core::transport::RpcTransport;
use chainstake_http::{HttpClientConfig, HttpRpcClient};

/// Builds the transport a session uses for one chain.
///
/// Called once per chain when a session opens.
pub trait ClientFactory: Send + Sync + 'static {
    fn connect(
        &self,
        chain: Chain,
        endpoint: &ChainEndpoint,
    ) -> Result<Arc<dyn RpcTransport>, StakeError>;
}

/// Factory producing [`HttpRpcClient`]s.
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    config: HttpClientConfig,
}

impl HttpClientFactory {
    pub fn new(config: HttpClientConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn connect(
        &self,
        chain: Chain,
        endpoint: &ChainEndpoint,
    ) -> Result<Arc<dyn RpcTransport>, StakeError> {
        tracing::debug!(%chain, url = %endpoint.rpc_url, "creating HTTP client");
        let client = HttpRpcClient::new(endpoint.rpc_url.clone(), &self.config)?;
        Ok(Arc::new(client))
    }
}
