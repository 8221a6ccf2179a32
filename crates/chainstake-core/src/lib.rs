//! chainstake-core: foundation types for ChainStake.
//!
//! # Overview
//!
//! ChainStake reads HEX staking data from several EVM chains at once and
//! delivers fully assembled results to a single consumer. The core crate
//! defines:
//!
//! - [`Chain`] / [`ChainEndpointRegistry`]: the closed set of supported chains
//! - [`RpcTransport`]: the async trait every chain client implements
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`StakeAggregationCache`]: per-session accumulator of partial stake lists
//! - [`EventSink`] / [`EventStream`]: the ordered delivery channel
//! - [`StakeEvent`]: the event taxonomy emitted to consumers

pub mod cache;
pub mod chain;
pub mod error;
pub mod event;
pub mod request;
pub mod sink;
pub mod transport;
pub mod types;

pub use cache::{AggregationKey, CacheOutcome, Generation, StakeAggregationCache};
pub use chain::{Chain, ChainEndpoint, ChainEndpointRegistry, HEX_CONTRACT};
pub use error::{StakeError, TransportError};
pub use event::StakeEvent;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use sink::{EventSink, EventStream};
pub use transport::RpcTransport;
pub use types::{DailyData, GlobalInfo, StakeEntry};

pub use alloy_primitives::{Address, U256};
