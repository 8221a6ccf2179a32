//! Per-session pool of chain clients.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chainstake_core::chain::{Chain, ChainEndpointRegistry};
use chainstake_core::error::StakeError;
use chainstake_hex::{HexAbi, HexContract};

use crate::factory::ClientFactory;
use crate::session::SessionId;

/// One HEX contract client per provisioned chain, owned by a single session.
///
/// Clients are created eagerly for every chain in the registry when the pool
/// opens, whether or not the session ever queries that chain. After
/// [`close`](Self::close) every lookup fails with [`StakeError::PoolClosed`].
pub struct ChainClientPool {
    session: SessionId,
    clients: RwLock<Option<HashMap<Chain, Arc<HexContract>>>>,
}

impl ChainClientPool {
    pub fn open(
        session: SessionId,
        registry: &ChainEndpointRegistry,
        factory: &dyn ClientFactory,
        abi: Arc<HexAbi>,
    ) -> Result<Self, StakeError> {
        let mut clients = HashMap::with_capacity(registry.len());
        for (chain, endpoint) in registry.iter() {
            let transport = factory.connect(chain, endpoint)?;
            clients.insert(
                chain,
                Arc::new(HexContract::new(transport, endpoint.contract, abi.clone())),
            );
        }
        tracing::debug!(%session, chains = clients.len(), "client pool opened");

        Ok(Self {
            session,
            clients: RwLock::new(Some(clients)),
        })
    }

    /// Client for `chain`.
    pub fn get(&self, chain: Chain) -> Result<Arc<HexContract>, StakeError> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        let clients = clients.as_ref().ok_or(StakeError::PoolClosed)?;
        clients
            .get(&chain)
            .cloned()
            .ok_or_else(|| StakeError::UnknownChain(chain.to_string()))
    }

    /// Provisioned chains, sorted.
    pub fn chains(&self) -> Vec<Chain> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        let mut chains: Vec<Chain> = clients
            .as_ref()
            .map(|c| c.keys().copied().collect())
            .unwrap_or_default();
        chains.sort();
        chains
    }

    /// Release every client. Returns `true` if this call closed the pool.
    pub fn close(&self) -> bool {
        let released = self
            .clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match released {
            Some(clients) => {
                tracing::debug!(session = %self.session, chains = clients.len(), "client pool closed");
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
