//! Events delivered to a session's consumer.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::types::{DailyData, GlobalInfo, StakeEntry};

/// Every result the core can emit. No other event types exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StakeEvent {
    /// A complete stake list for one address on one chain, sorted by stake id.
    StakeList {
        entries: Vec<StakeEntry>,
        address: Address,
        chain: Chain,
    },
    GlobalInfo {
        info: GlobalInfo,
        chain: Chain,
    },
    CurrentDay {
        day: u64,
        chain: Chain,
    },
    /// Token balance in hearts.
    Balance {
        amount: U256,
        address: Address,
        chain: Chain,
    },
    DailyDataRange {
        days: Vec<DailyData>,
        chain: Chain,
    },
}

impl StakeEvent {
    pub fn chain(&self) -> Chain {
        match self {
            Self::StakeList { chain, .. }
            | Self::GlobalInfo { chain, .. }
            | Self::CurrentDay { chain, .. }
            | Self::Balance { chain, .. }
            | Self::DailyDataRange { chain, .. } => *chain,
        }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StakeList { .. } => "stake_list",
            Self::GlobalInfo { .. } => "global_info",
            Self::CurrentDay { .. } => "current_day",
            Self::Balance { .. } => "balance",
            Self::DailyDataRange { .. } => "daily_data_range",
        }
    }
}
