//! File-based configuration.
//!
//! ```yaml
//! chains:
//!   ethereum:
//!     rpc_url: https://cloudflare-eth.com
//!   pulsechain: {}
//! http:
//!   request_timeout_ms: 20000
//! log:
//!   level: info
//!   components:
//!     chainstake-session: debug
//! ```
//!
//! Every section is optional. Omitting `chains` provisions every supported
//! chain with its default endpoint; listing `chains` provisions only those.

use std::collections::BTreeMap;
use std::path::Path;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use chainstake_core::chain::{Chain, ChainEndpoint, ChainEndpointRegistry, HEX_CONTRACT};
use chainstake_core::error::StakeError;
use chainstake_http::HttpClientConfig;

use crate::tracing_setup::LogConfig;

/// Upper bound on the stake count a session accepts for one address.
pub const DEFAULT_MAX_STAKES: u64 = 10_000;

/// Per-chain overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeConfig {
    #[serde(default = "all_chains")]
    pub chains: BTreeMap<Chain, ChainConfig>,
    #[serde(default)]
    pub http: HttpClientConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Stake counts above this are refused instead of fanned out.
    #[serde(default = "default_max_stakes")]
    pub max_stakes: u64,
}

fn default_max_stakes() -> u64 {
    DEFAULT_MAX_STAKES
}

fn all_chains() -> BTreeMap<Chain, ChainConfig> {
    Chain::ALL
        .iter()
        .map(|c| (*c, ChainConfig::default()))
        .collect()
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            chains: all_chains(),
            http: HttpClientConfig::default(),
            log: LogConfig::default(),
            max_stakes: DEFAULT_MAX_STAKES,
        }
    }
}

impl StakeConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, StakeError> {
        serde_yaml::from_str(yaml).map_err(|e| StakeError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StakeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StakeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }

    /// Build the endpoint registry for the configured chains.
    pub fn registry(&self) -> Result<ChainEndpointRegistry, StakeError> {
        let mut registry = ChainEndpointRegistry::empty();
        for (chain, cfg) in &self.chains {
            let rpc_url = cfg
                .rpc_url
                .clone()
                .unwrap_or_else(|| chain.default_rpc_url().to_string());
            if rpc_url.trim().is_empty() {
                return Err(StakeError::Config(format!("{chain}: rpc_url is empty")));
            }
            registry = registry.with_endpoint(
                *chain,
                ChainEndpoint {
                    rpc_url,
                    contract: cfg.contract.unwrap_or(HEX_CONTRACT),
                },
            );
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = StakeConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, StakeConfig::default());
        let reg = cfg.registry().unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.resolve(Chain::Pulsechain).unwrap(), "https://rpc.pulsechain.com");
    }

    #[test]
    fn listed_chains_only() {
        let cfg = StakeConfig::from_yaml_str(
            r#"
chains:
  ethereum:
    rpc_url: http://localhost:8545
http:
  request_timeout_ms: 2500
log:
  level: debug
"#,
        )
        .unwrap();
        let reg = cfg.registry().unwrap();
        assert_eq!(reg.resolve(Chain::Ethereum).unwrap(), "http://localhost:8545");
        assert!(matches!(
            reg.resolve(Chain::Pulsechain),
            Err(StakeError::UnknownChain(_))
        ));
        assert_eq!(cfg.http.request_timeout_ms, Some(2500));
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.max_stakes, DEFAULT_MAX_STAKES);
    }

    #[test]
    fn max_stakes_override() {
        let cfg = StakeConfig::from_yaml_str("max_stakes: 250
").unwrap();
        assert_eq!(cfg.max_stakes, 250);
        assert_eq!(cfg.chains.len(), 2);
    }

    #[test]
    fn contract_override() {
        let cfg = StakeConfig::from_yaml_str(
            r#"
chains:
  pulsechain:
    contract: "0x0000000000000000000000000000000000000042"
"#,
        )
        .unwrap();
        let reg = cfg.registry().unwrap();
        let ep = reg.endpoint(Chain::Pulsechain).unwrap();
        assert_eq!(ep.contract, "0x0000000000000000000000000000000000000042".parse::<Address>().unwrap());
    }

    #[test]
    fn unknown_chain_key_is_rejected() {
        let err = StakeConfig::from_yaml_str("chains:\n  solana: {}\n").unwrap_err();
        assert!(matches!(err, StakeError::Config(_)));
    }

    #[test]
    fn empty_url_is_rejected() {
        let cfg = StakeConfig::from_yaml_str("chains:\n  ethereum:\n    rpc_url: \"\"\n").unwrap();
        assert!(matches!(cfg.registry(), Err(StakeError::Config(_))));
    }
}
