//! chainstake-session: session-scoped retrieval of HEX staking data.
//!
//! A [`SessionManager`] opens [`Session`]s. Each session owns a
//! [`ChainClientPool`] with one client per configured chain, a stake
//! aggregation cache and an event sink. Queries go through the session's
//! [`QueryDispatcher`]; they return immediately and their results arrive on
//! the [`EventStream`](chainstake_core::EventStream) handed out by `open`.
//!
//! ```rust,no_run
//! use chainstake_core::Chain;
//! use chainstake_session::{SessionManager, StakeConfig};
//!
//! # async fn run() -> Result<(), chainstake_core::StakeError> {
//! let manager = SessionManager::from_config(&StakeConfig::default())?;
//! let (session, mut events) = manager.open()?;
//! let owner = "0x0000000000000000000000000000000000000abc".parse().unwrap();
//! session.dispatcher().fetch_stakes(owner, Chain::Pulsechain)?;
//! if let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! session.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod factory;
pub mod pool;
pub mod session;
pub mod tracing_setup;

pub use config::{ChainConfig, StakeConfig};
pub use dispatcher::QueryDispatcher;
pub use factory::{ClientFactory, HttpClientFactory};
pub use pool::ChainClientPool;
pub use session::{Session, SessionId, SessionManager, SessionState};
pub use tracing_setup::{init_tracing, LogConfig};
