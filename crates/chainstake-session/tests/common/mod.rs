//! In-memory HEX chain used by the session tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{hex, Address, U256};
use async_trait::async_trait;
use serde_json::Value;

use chainstake_core::chain::{Chain, ChainEndpoint, ChainEndpointRegistry};
use chainstake_core::error::{StakeError, TransportError};
use chainstake_core::request::{JsonRpcRequest, JsonRpcResponse};
use chainstake_core::transport::RpcTransport;
use chainstake_core::types::{DailyData, StakeEntry};
use chainstake_hex::HexAbi;
use chainstake_session::{ClientFactory, SessionManager};

pub fn owner(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = n;
    Address::from(bytes)
}

pub fn stake(id: u64) -> StakeEntry {
    StakeEntry {
        stake_id: id,
        staked_hearts: u128::from(id + 1) * 1_000_000,
        stake_shares: u128::from(id + 1) * 500,
        locked_day: 1_000 + id as u16,
        staked_days: 369,
        unlocked_day: 0,
        is_auto_stake: id % 2 == 0,
    }
}

/// Scripted chain answering the HEX read functions.
pub struct MockChain {
    url: String,
    abi: HexAbi,
    stakes: Mutex<HashMap<Address, Vec<StakeEntry>>>,
    failing_indices: Mutex<HashSet<u64>>,
    fail_count: bool,
    /// Overrides the `stakeCount` answer when set.
    reported_count: Option<u64>,
    delay: Duration,
    /// Extra latency for `stakeLists` only.
    item_delay: Duration,
    /// Later indices answer first when set.
    reverse_order: bool,
    pub current_day: u64,
    pub balance: U256,
    pub calls: AtomicUsize,
}

impl MockChain {
    pub fn new(name: &str) -> Self {
        Self {
            url: format!("mock://{name}"),
            abi: HexAbi::new().unwrap(),
            stakes: Mutex::new(HashMap::new()),
            failing_indices: Mutex::new(HashSet::new()),
            fail_count: false,
            reported_count: None,
            delay: Duration::ZERO,
            item_delay: Duration::ZERO,
            reverse_order: false,
            current_day: 0,
            balance: U256::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_stakes(self, owner: Address, entries: Vec<StakeEntry>) -> Self {
        self.stakes.lock().unwrap().insert(owner, entries);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn reporting_count(mut self, count: u64) -> Self {
        self.reported_count = Some(count);
        self
    }

    /// Replace `owner`'s stakes; calls already received keep the old answer.
    pub fn set_stakes(&self, owner: Address, entries: Vec<StakeEntry>) {
        self.stakes.lock().unwrap().insert(owner, entries);
    }

    pub fn reversed(mut self) -> Self {
        self.reverse_order = true;
        self
    }

    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    pub fn failing_index(self, index: u64) -> Self {
        self.failing_indices.lock().unwrap().insert(index);
        self
    }

    pub fn with_current_day(mut self, day: u64) -> Self {
        self.current_day = day;
        self
    }

    pub fn with_balance(mut self, balance: u64) -> Self {
        self.balance = U256::from(balance);
        self
    }

    /// Stop failing stake list items.
    pub fn heal(&self) {
        self.failing_indices.lock().unwrap().clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn stakes_of(&self, owner: Address) -> Vec<StakeEntry> {
        self.stakes.lock().unwrap().get(&owner).cloned().unwrap_or_default()
    }

    fn answer(&self, function: &str, args: &[DynSolValue]) -> Result<Vec<DynSolValue>, TransportError> {
        let uint = |v: U256| DynSolValue::Uint(v, 256);
        match function {
            "stakeCount" => {
                if self.fail_count {
                    return Err(TransportError::Http("stakeCount unavailable".into()));
                }
                let owner = args[0].as_address().unwrap();
                let count = self
                    .reported_count
                    .unwrap_or(self.stakes_of(owner).len() as u64);
                Ok(vec![uint(U256::from(count))])
            }
            "stakeLists" => {
                let owner = args[0].as_address().unwrap();
                let index = args[1].as_uint().unwrap().0.to::<u64>();
                if self.failing_indices.lock().unwrap().contains(&index) {
                    return Err(TransportError::Http(format!("stakeLists({index}) dropped")));
                }
                let entry = self
                    .stakes_of(owner)
                    .get(index as usize)
                    .cloned()
                    .ok_or_else(|| TransportError::Other("index out of range".into()))?;
                Ok(vec![
                    DynSolValue::Uint(U256::from(entry.stake_id), 40),
                    DynSolValue::Uint(U256::from(entry.staked_hearts), 72),
                    DynSolValue::Uint(U256::from(entry.stake_shares), 72),
                    DynSolValue::Uint(U256::from(entry.locked_day), 16),
                    DynSolValue::Uint(U256::from(entry.staked_days), 16),
                    DynSolValue::Uint(U256::from(entry.unlocked_day), 16),
                    DynSolValue::Bool(entry.is_auto_stake),
                ])
            }
            "currentDay" => Ok(vec![uint(U256::from(self.current_day))]),
            "balanceOf" => Ok(vec![uint(self.balance)]),
            "globalInfo" => {
                let words = (0..13u64).map(|i| uint(U256::from(i + 1))).collect();
                Ok(vec![DynSolValue::FixedArray(words)])
            }
            "dailyDataRange" => {
                let begin = args[0].as_uint().unwrap().0.to::<u64>();
                let end = args[1].as_uint().unwrap().0.to::<u64>();
                let words = (begin..end)
                    .map(|day| {
                        uint(
                            DailyData {
                                payout_total: u128::from(day) * 10,
                                stake_shares_total: u128::from(day) * 20,
                                unclaimed_satoshis_total: day,
                            }
                            .pack(),
                        )
                    })
                    .collect();
                Ok(vec![DynSolValue::Array(words)])
            }
            other => Err(TransportError::Other(format!("unexpected call {other}"))),
        }
    }

    fn delay_for(&self, function: &str, args: &[DynSolValue]) -> Duration {
        if function != "stakeLists" {
            return self.delay;
        }
        let mut delay = self.delay + self.item_delay;
        if self.reverse_order {
            let index = args[1].as_uint().unwrap().0.to::<u64>();
            let slot = 20u64.saturating_sub(index);
            delay += Duration::from_millis(slot * 5);
        }
        delay
    }
}

#[async_trait]
impl RpcTransport for MockChain {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = req
            .call_data()
            .ok_or_else(|| TransportError::Other("expected eth_call".into()))?;
        let calldata = hex::decode(data).map_err(|e| TransportError::Other(e.to_string()))?;
        let (func, args) = self
            .abi
            .decode_call(&calldata)
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let name = func.name.clone();

        // answer from the state at arrival time, then simulate latency
        let output = self.answer(&name, &args);
        let delay = self.delay_for(&name, &args);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let output = output?;
        let encoded = self
            .abi
            .encode_output(&name, output)
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(JsonRpcResponse::success(
            req.id,
            Value::String(format!("0x{}", hex::encode(encoded))),
        ))
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Hands out the same mock per chain to every session.
#[derive(Default)]
pub struct MockFactory {
    chains: HashMap<Chain, Arc<MockChain>>,
}

impl MockFactory {
    pub fn with_chain(mut self, chain: Chain, mock: MockChain) -> Self {
        self.chains.insert(chain, Arc::new(mock));
        self
    }

    pub fn mock(&self, chain: Chain) -> Arc<MockChain> {
        self.chains[&chain].clone()
    }

    pub fn registry(&self) -> ChainEndpointRegistry {
        self.chains.keys().fold(ChainEndpointRegistry::empty(), |reg, chain| {
            reg.with_endpoint(*chain, ChainEndpoint::new(format!("mock://{chain}")))
        })
    }
}

impl ClientFactory for MockFactory {
    fn connect(
        &self,
        chain: Chain,
        _endpoint: &ChainEndpoint,
    ) -> Result<Arc<dyn RpcTransport>, StakeError> {
        let mock: Arc<dyn RpcTransport> = self
            .chains
            .get(&chain)
            .cloned()
            .ok_or_else(|| StakeError::UnknownChain(chain.to_string()))?;
        Ok(mock)
    }
}

/// Manager over `factory`'s chains; returns the factory for later inspection.
pub fn manager(factory: MockFactory) -> (SessionManager, Arc<MockFactory>) {
    let factory = Arc::new(factory);
    let manager = SessionManager::new(factory.registry(), factory.clone()).unwrap();
    (manager, factory)
}
