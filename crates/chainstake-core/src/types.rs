//! Decoded on-chain records.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A single stake as returned by `stakeLists(address, index)`.
///
/// `stake_id` is assigned by the contract and identifies the entry within an
/// address on a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEntry {
    pub stake_id: u64,
    pub staked_hearts: u128,
    pub stake_shares: u128,
    pub locked_day: u16,
    pub staked_days: u16,
    /// Zero while the stake is still active.
    pub unlocked_day: u16,
    pub is_auto_stake: bool,
}

/// Number of words returned by `globalInfo()`.
pub const GLOBAL_INFO_WORDS: usize = 13;

/// Contract-wide state from `globalInfo()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalInfo {
    pub locked_hearts_total: U256,
    pub next_stake_shares_total: U256,
    pub share_rate: U256,
    pub stake_penalty_total: U256,
    pub daily_data_count: U256,
    pub stake_shares_total: U256,
    pub latest_stake_id: U256,
    pub unclaimed_satoshis_total: U256,
    pub claimed_satoshis_total: U256,
    pub claimed_btc_addr_count: U256,
    pub block_timestamp: U256,
    pub total_supply: U256,
    pub xf_lobby_current_day: U256,
}

impl GlobalInfo {
    pub fn from_words(w: [U256; GLOBAL_INFO_WORDS]) -> Self {
        Self {
            locked_hearts_total: w[0],
            next_stake_shares_total: w[1],
            share_rate: w[2],
            stake_penalty_total: w[3],
            daily_data_count: w[4],
            stake_shares_total: w[5],
            latest_stake_id: w[6],
            unclaimed_satoshis_total: w[7],
            claimed_satoshis_total: w[8],
            claimed_btc_addr_count: w[9],
            block_timestamp: w[10],
            total_supply: w[11],
            xf_lobby_current_day: w[12],
        }
    }
}

const HEARTS_BITS: usize = 72;
const SATOSHIS_BITS: usize = 56;

/// One day of payout history, unpacked from a `dailyDataRange` word.
///
/// Word layout (low to high): payout total (72 bits), stake shares total
/// (72 bits), unclaimed satoshis total (56 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyData {
    pub payout_total: u128,
    pub stake_shares_total: u128,
    pub unclaimed_satoshis_total: u64,
}

impl DailyData {
    pub fn unpack(word: U256) -> Self {
        let hearts_mask = (U256::from(1u8) << HEARTS_BITS) - U256::from(1u8);
        let sats_mask = (U256::from(1u8) << SATOSHIS_BITS) - U256::from(1u8);

        let payout = word & hearts_mask;
        let shares = (word >> HEARTS_BITS) & hearts_mask;
        let sats = (word >> (HEARTS_BITS * 2)) & sats_mask;

        // masked values always fit their target widths
        Self {
            payout_total: payout.to::<u128>(),
            stake_shares_total: shares.to::<u128>(),
            unclaimed_satoshis_total: sats.to::<u64>(),
        }
    }

    pub fn pack(&self) -> U256 {
        U256::from(self.payout_total)
            | (U256::from(self.stake_shares_total) << HEARTS_BITS)
            | (U256::from(self.unclaimed_satoshis_total) << (HEARTS_BITS * 2))
    }
}
