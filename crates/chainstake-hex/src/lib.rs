//! chainstake-hex: typed access to the HEX staking contract.
//!
//! - [`HexAbi`]: ABI encoding/decoding for the contract functions ChainStake reads
//! - [`HexContract`]: `eth_call` wrappers returning decoded domain types

pub mod abi;
pub mod contract;

pub use abi::{AbiError, HexAbi};
pub use contract::HexContract;
