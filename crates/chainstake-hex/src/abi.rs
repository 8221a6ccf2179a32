//! ABI definition and codec for the HEX contract read functions.
//!
//! Calldata layout is the standard one: 4-byte selector followed by the
//! ABI-encoded argument tuple. Return data is the ABI-encoded output tuple.

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Function, JsonAbi, Param};
use alloy_primitives::U256;
use thiserror::Error;

use chainstake_core::error::StakeError;
use chainstake_core::types::{DailyData, GlobalInfo, StakeEntry, GLOBAL_INFO_WORDS};

/// Subset of the HEX ABI used by ChainStake.
const HEX_ABI_JSON: &str = r#"[
  {"type":"function","name":"stakeCount","stateMutability":"view",
   "inputs":[{"name":"stakerAddr","type":"address"}],
   "outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","name":"stakeLists","stateMutability":"view",
   "inputs":[{"name":"","type":"address"},{"name":"","type":"uint256"}],
   "outputs":[
     {"name":"stakeId","type":"uint40"},
     {"name":"stakedHearts","type":"uint72"},
     {"name":"stakeShares","type":"uint72"},
     {"name":"lockedDay","type":"uint16"},
     {"name":"stakedDays","type":"uint16"},
     {"name":"unlockedDay","type":"uint16"},
     {"name":"isAutoStake","type":"bool"}]},
  {"type":"function","name":"globalInfo","stateMutability":"view",
   "inputs":[],
   "outputs":[{"name":"","type":"uint256[13]"}]},
  {"type":"function","name":"currentDay","stateMutability":"view",
   "inputs":[],
   "outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","name":"dailyDataRange","stateMutability":"view",
   "inputs":[{"name":"beginDay","type":"uint256"},{"name":"endDay","type":"uint256"}],
   "outputs":[{"name":"list","type":"uint256[]"}]},
  {"type":"function","name":"balanceOf","stateMutability":"view",
   "inputs":[{"name":"account","type":"address"}],
   "outputs":[{"name":"","type":"uint256"}]}
]"#;

pub const STAKE_COUNT: &str = "stakeCount";
pub const STAKE_LISTS: &str = "stakeLists";
pub const GLOBAL_INFO: &str = "globalInfo";
pub const CURRENT_DAY: &str = "currentDay";
pub const DAILY_DATA_RANGE: &str = "dailyDataRange";
pub const BALANCE_OF: &str = "balanceOf";

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("invalid ABI JSON: {0}")]
    InvalidAbi(String),

    #[error("function '{0}' not found in ABI")]
    UnknownFunction(String),

    #[error("encode '{function}': {reason}")]
    Encode { function: String, reason: String },

    #[error("decode '{function}': {reason}")]
    Decode { function: String, reason: String },

    /// Decoded fine, but the values are not what the function returns.
    #[error("unexpected shape for '{function}': {reason}")]
    UnexpectedShape { function: String, reason: String },
}

impl From<AbiError> for StakeError {
    fn from(e: AbiError) -> Self {
        StakeError::Decode(e.to_string())
    }
}

/// Encoder/decoder for the HEX read functions.
#[derive(Debug, Clone)]
pub struct HexAbi {
    abi: JsonAbi,
}

impl HexAbi {
    pub fn new() -> Result<Self, AbiError> {
        let abi: JsonAbi =
            serde_json::from_str(HEX_ABI_JSON).map_err(|e| AbiError::InvalidAbi(e.to_string()))?;
        Ok(Self { abi })
    }

    pub fn function(&self, name: &str) -> Result<&Function, AbiError> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| AbiError::UnknownFunction(name.to_string()))
    }

    /// `selector ++ abi_encode(args)` for `name`.
    pub fn encode_call(&self, name: &str, args: Vec<DynSolValue>) -> Result<Vec<u8>, AbiError> {
        let func = self.function(name)?;
        if args.len() != func.inputs.len() {
            return Err(AbiError::Encode {
                function: name.to_string(),
                reason: format!(
                    "argument count mismatch: ABI has {}, got {}",
                    func.inputs.len(),
                    args.len()
                ),
            });
        }

        let mut calldata = func.selector().to_vec();
        calldata.extend_from_slice(&DynSolValue::Tuple(args).abi_encode_params());
        Ok(calldata)
    }

    /// Decode the return data of `name` into its output values.
    pub fn decode_output(&self, name: &str, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
        let func = self.function(name)?;
        decode_params(name, &func.outputs, data)
    }

    /// Match calldata to a function by selector and decode its arguments.
    pub fn decode_call(&self, calldata: &[u8]) -> Result<(&Function, Vec<DynSolValue>), AbiError> {
        if calldata.len() < 4 {
            return Err(AbiError::Decode {
                function: "<unknown>".into(),
                reason: format!("calldata too short: {} bytes", calldata.len()),
            });
        }
        let (selector, args) = calldata.split_at(4);
        let func = self
            .abi
            .functions()
            .find(|f| f.selector().as_slice() == selector)
            .ok_or_else(|| {
                AbiError::UnknownFunction(format!("0x{}", alloy_primitives::hex::encode(selector)))
            })?;
        let values = decode_params(&func.name, &func.inputs, args)?;
        Ok((func, values))
    }

    /// Encode `values` as the return data of `name`.
    pub fn encode_output(&self, name: &str, values: Vec<DynSolValue>) -> Result<Vec<u8>, AbiError> {
        let func = self.function(name)?;
        if values.len() != func.outputs.len() {
            return Err(AbiError::Encode {
                function: name.to_string(),
                reason: format!(
                    "output count mismatch: ABI has {}, got {}",
                    func.outputs.len(),
                    values.len()
                ),
            });
        }
        Ok(DynSolValue::Tuple(values).abi_encode_params())
    }
}

fn decode_params(name: &str, params: &[Param], data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
    let types = params
        .iter()
        .map(|p| p.resolve())
        .collect::<Result<Vec<DynSolType>, _>>()
        .map_err(|e| AbiError::Decode {
            function: name.to_string(),
            reason: e.to_string(),
        })?;

    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|e| AbiError::Decode {
            function: name.to_string(),
            reason: e.to_string(),
        })?;

    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}

fn shape(function: &str, reason: impl Into<String>) -> AbiError {
    AbiError::UnexpectedShape {
        function: function.to_string(),
        reason: reason.into(),
    }
}

fn uint_at(function: &str, values: &[DynSolValue], i: usize) -> Result<U256, AbiError> {
    values
        .get(i)
        .and_then(DynSolValue::as_uint)
        .map(|(u, _)| u)
        .ok_or_else(|| shape(function, format!("output {i} is not a uint")))
}

fn narrow<T: TryFrom<U256>>(function: &str, field: &str, v: U256) -> Result<T, AbiError> {
    T::try_from(v).map_err(|_| shape(function, format!("{field} out of range: {v}")))
}

/// Single `uint256` return value.
pub fn decode_uint(function: &str, values: &[DynSolValue]) -> Result<U256, AbiError> {
    uint_at(function, values, 0)
}

/// `stakeLists` outputs → [`StakeEntry`].
pub fn decode_stake(values: &[DynSolValue]) -> Result<StakeEntry, AbiError> {
    let f = STAKE_LISTS;
    if values.len() != 7 {
        return Err(shape(f, format!("expected 7 outputs, got {}", values.len())));
    }
    let is_auto_stake = values[6]
        .as_bool()
        .ok_or_else(|| shape(f, "isAutoStake is not a bool"))?;

    Ok(StakeEntry {
        stake_id: narrow(f, "stakeId", uint_at(f, values, 0)?)?,
        staked_hearts: narrow(f, "stakedHearts", uint_at(f, values, 1)?)?,
        stake_shares: narrow(f, "stakeShares", uint_at(f, values, 2)?)?,
        locked_day: narrow(f, "lockedDay", uint_at(f, values, 3)?)?,
        staked_days: narrow(f, "stakedDays", uint_at(f, values, 4)?)?,
        unlocked_day: narrow(f, "unlockedDay", uint_at(f, values, 5)?)?,
        is_auto_stake,
    })
}

/// `globalInfo` output (`uint256[13]`) → [`GlobalInfo`].
pub fn decode_global_info(values: &[DynSolValue]) -> Result<GlobalInfo, AbiError> {
    let f = GLOBAL_INFO;
    let words = values
        .first()
        .and_then(DynSolValue::as_fixed_array)
        .ok_or_else(|| shape(f, "expected a fixed uint256 array"))?;
    if words.len() != GLOBAL_INFO_WORDS {
        return Err(shape(
            f,
            format!("expected {GLOBAL_INFO_WORDS} words, got {}", words.len()),
        ));
    }

    let mut out = [U256::ZERO; GLOBAL_INFO_WORDS];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = uint_at(f, words, i)?;
    }
    Ok(GlobalInfo::from_words(out))
}

/// `dailyDataRange` output (`uint256[]`) → unpacked days.
pub fn decode_daily_data(values: &[DynSolValue]) -> Result<Vec<DailyData>, AbiError> {
    let f = DAILY_DATA_RANGE;
    let words = values
        .first()
        .and_then(DynSolValue::as_array)
        .ok_or_else(|| shape(f, "expected a uint256 array"))?;
    (0..words.len())
        .map(|i| uint_at(f, words, i).map(DailyData::unpack))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use std::str::FromStr;

    fn abi() -> HexAbi {
        HexAbi::new().unwrap()
    }

    fn uint(v: u64, bits: usize) -> DynSolValue {
        DynSolValue::Uint(U256::from(v), bits)
    }

    #[test]
    fn abi_parses_all_functions() {
        let abi = abi();
        for name in [STAKE_COUNT, STAKE_LISTS, GLOBAL_INFO, CURRENT_DAY, DAILY_DATA_RANGE, BALANCE_OF] {
            assert!(abi.function(name).is_ok(), "missing {name}");
        }
        assert!(matches!(abi.function("transfer"), Err(AbiError::UnknownFunction(_))));
    }

    #[test]
    fn encode_call_layout() {
        let owner = Address::from_str("0x00000000000000000000000000000000000000ab").unwrap();
        let calldata = abi()
            .encode_call(STAKE_LISTS, vec![DynSolValue::Address(owner), uint(3, 256)])
            .unwrap();
        assert_eq!(calldata.len(), 4 + 64);
        assert_eq!(calldata[4 + 31], 0xab);
        assert_eq!(calldata[4 + 63], 3);
    }

    #[test]
    fn encode_call_rejects_wrong_arity() {
        let err = abi().encode_call(STAKE_COUNT, vec![]).unwrap_err();
        assert!(matches!(err, AbiError::Encode { .. }));
    }

    #[test]
    fn decode_call_finds_function_by_selector() {
        let abi = abi();
        let calldata = abi
            .encode_call(DAILY_DATA_RANGE, vec![uint(10, 256), uint(20, 256)])
            .unwrap();
        let (func, args) = abi.decode_call(&calldata).unwrap();
        assert_eq!(func.name, DAILY_DATA_RANGE);
        assert_eq!(decode_uint(DAILY_DATA_RANGE, &args[1..]).unwrap(), U256::from(20));
    }

    #[test]
    fn decode_stake_from_return_data() {
        let abi = abi();
        let data = abi
            .encode_output(
                STAKE_LISTS,
                vec![
                    uint(4242, 40),
                    uint(1_000_000, 72),
                    uint(500, 72),
                    uint(700, 16),
                    uint(3650, 16),
                    uint(0, 16),
                    DynSolValue::Bool(true),
                ],
            )
            .unwrap();
        let values = abi.decode_output(STAKE_LISTS, &data).unwrap();
        let stake = decode_stake(&values).unwrap();
        assert_eq!(stake.stake_id, 4242);
        assert_eq!(stake.staked_hearts, 1_000_000);
        assert_eq!(stake.staked_days, 3650);
        assert!(stake.is_auto_stake);
    }

    #[test]
    fn decode_truncated_return_data_fails() {
        let err = abi().decode_output(CURRENT_DAY, &[0u8; 7]).unwrap_err();
        assert!(matches!(err, AbiError::Decode { .. }));
    }

    #[test]
    fn decode_global_info_words() {
        let abi = abi();
        let words = (0..GLOBAL_INFO_WORDS as u64).map(|i| uint(i * 10, 256)).collect();
        let data = abi
            .encode_output(GLOBAL_INFO, vec![DynSolValue::FixedArray(words)])
            .unwrap();
        let info = decode_global_info(&abi.decode_output(GLOBAL_INFO, &data).unwrap()).unwrap();
        assert_eq!(info.share_rate, U256::from(20));
        assert_eq!(info.xf_lobby_current_day, U256::from(120));
    }

    #[test]
    fn decode_daily_data_list() {
        let abi = abi();
        let day = DailyData {
            payout_total: 77,
            stake_shares_total: 88,
            unclaimed_satoshis_total: 99,
        };
        let data = abi
            .encode_output(
                DAILY_DATA_RANGE,
                vec![DynSolValue::Array(vec![DynSolValue::Uint(day.pack(), 256); 2])],
            )
            .unwrap();
        let days = decode_daily_data(&abi.decode_output(DAILY_DATA_RANGE, &data).unwrap()).unwrap();
        assert_eq!(days, vec![day, day]);
    }
}
