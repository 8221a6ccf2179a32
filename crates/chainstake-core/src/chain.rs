//! Supported chains and the endpoint registry.

use std::collections::BTreeMap;
use std::str::FromStr;

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::error::StakeError;

/// HEX contract address; identical on Ethereum and PulseChain.
pub const HEX_CONTRACT: Address = address!("2b591e99afe9f32eaa6214f7b7629768c40eeb39");

/// The closed set of chains ChainStake knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Pulsechain,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Ethereum, Chain::Pulsechain];

    /// EIP-155 chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Pulsechain => 369,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Pulsechain => "pulsechain",
        }
    }

    /// Public RPC endpoint used when no override is configured.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Ethereum => "https://cloudflare-eth.com",
            Self::Pulsechain => "https://rpc.pulsechain.com",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = StakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "eth" | "1" => Ok(Self::Ethereum),
            "pulsechain" | "pls" | "369" => Ok(Self::Pulsechain),
            other => Err(StakeError::UnknownChain(other.to_string())),
        }
    }
}

/// Connection parameters for one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    pub rpc_url: String,
    /// Contract queried for stakes and balances.
    pub contract: Address,
}

impl ChainEndpoint {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            contract: HEX_CONTRACT,
        }
    }
}

/// Static mapping from chain to its endpoint.
///
/// Lookups are pure; a chain missing from the registry resolves to
/// [`StakeError::UnknownChain`].
#[derive(Debug, Clone)]
pub struct ChainEndpointRegistry {
    endpoints: BTreeMap<Chain, ChainEndpoint>,
}

impl ChainEndpointRegistry {
    /// A registry with no chains; populate with [`with_endpoint`](Self::with_endpoint).
    pub fn empty() -> Self {
        Self {
            endpoints: BTreeMap::new(),
        }
    }

    pub fn with_endpoint(mut self, chain: Chain, endpoint: ChainEndpoint) -> Self {
        self.endpoints.insert(chain, endpoint);
        self
    }

    /// RPC URL for `chain`.
    pub fn resolve(&self, chain: Chain) -> Result<&str, StakeError> {
        self.endpoint(chain).map(|e| e.rpc_url.as_str())
    }

    pub fn endpoint(&self, chain: Chain) -> Result<&ChainEndpoint, StakeError> {
        self.endpoints
            .get(&chain)
            .ok_or_else(|| StakeError::UnknownChain(chain.to_string()))
    }

    /// Iterate over every provisioned chain, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (Chain, &ChainEndpoint)> {
        self.endpoints.iter().map(|(c, e)| (*c, e))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Default for ChainEndpointRegistry {
    fn default() -> Self {
        Chain::ALL.iter().fold(Self::empty(), |reg, chain| {
            reg.with_endpoint(*chain, ChainEndpoint::new(chain.default_rpc_url()))
        })
    }
}
