//! Typed `eth_call` wrappers for the HEX contract.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{hex, Address, U256};

use chainstake_core::error::{StakeError, TransportError};
use chainstake_core::request::JsonRpcRequest;
use chainstake_core::transport::RpcTransport;
use chainstake_core::types::{DailyData, GlobalInfo, StakeEntry};

use crate::abi::{self, HexAbi};

/// HEX contract bound to one chain's transport.
pub struct HexContract {
    transport: Arc<dyn RpcTransport>,
    address: Address,
    abi: Arc<HexAbi>,
    next_id: AtomicU64,
}

impl HexContract {
    pub fn new(transport: Arc<dyn RpcTransport>, address: Address, abi: Arc<HexAbi>) -> Self {
        Self {
            transport,
            address,
            abi,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    /// Number of stakes currently held by `owner`.
    pub async fn stake_count(&self, owner: Address) -> Result<u64, StakeError> {
        let out = self
            .call(abi::STAKE_COUNT, vec![DynSolValue::Address(owner)])
            .await?;
        let count = abi::decode_uint(abi::STAKE_COUNT, &out)?;
        u64::try_from(count).map_err(|_| StakeError::Decode(format!("stake count out of range: {count}")))
    }

    /// The stake at position `index` in `owner`'s stake list.
    pub async fn stake_at(&self, owner: Address, index: u64) -> Result<StakeEntry, StakeError> {
        let out = self
            .call(
                abi::STAKE_LISTS,
                vec![DynSolValue::Address(owner), DynSolValue::Uint(U256::from(index), 256)],
            )
            .await?;
        Ok(abi::decode_stake(&out)?)
    }

    pub async fn global_info(&self) -> Result<GlobalInfo, StakeError> {
        let out = self.call(abi::GLOBAL_INFO, vec![]).await?;
        Ok(abi::decode_global_info(&out)?)
    }

    pub async fn current_day(&self) -> Result<u64, StakeError> {
        let out = self.call(abi::CURRENT_DAY, vec![]).await?;
        let day = abi::decode_uint(abi::CURRENT_DAY, &out)?;
        u64::try_from(day).map_err(|_| StakeError::Decode(format!("current day out of range: {day}")))
    }

    /// Token balance of `owner`, in hearts.
    pub async fn balance_of(&self, owner: Address) -> Result<U256, StakeError> {
        let out = self
            .call(abi::BALANCE_OF, vec![DynSolValue::Address(owner)])
            .await?;
        Ok(abi::decode_uint(abi::BALANCE_OF, &out)?)
    }

    /// Daily payout data for days `begin..end`.
    pub async fn daily_data_range(&self, begin: u64, end: u64) -> Result<Vec<DailyData>, StakeError> {
        let out = self
            .call(
                abi::DAILY_DATA_RANGE,
                vec![
                    DynSolValue::Uint(U256::from(begin), 256),
                    DynSolValue::Uint(U256::from(end), 256),
                ],
            )
            .await?;
        Ok(abi::decode_daily_data(&out)?)
    }

    async fn call(&self, function: &str, args: Vec<DynSolValue>) -> Result<Vec<DynSolValue>, StakeError> {
        let calldata = self.abi.encode_call(function, args)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::eth_call(id, self.address, &calldata);

        let result = self.transport.request(req).await?;
        let encoded = result.as_str().ok_or_else(|| {
            TransportError::Other(format!("{function}: eth_call result is not a hex string"))
        })?;
        let bytes = hex::decode(encoded)
            .map_err(|e| StakeError::Decode(format!("{function}: invalid hex in result: {e}")))?;

        tracing::trace!(function, url = %self.url(), bytes = bytes.len(), "eth_call returned");
        Ok(self.abi.decode_output(function, &bytes)?)
    }
}
