//! chainstake-http: HTTP JSON-RPC transport for ChainStake.

pub mod client;

pub use client::{HttpClientConfig, HttpRpcClient};
