//! Query dispatch for one session.
//!
//! Every `fetch_*` call validates the session synchronously, then spawns the
//! on-chain work and returns. Results arrive later on the session's event
//! stream; failed calls are logged and produce no event.
//!
//! Stake retrieval is a two-step fan-out:
//!
//! ```text
//! stakeCount(owner) ──► cache.begin(key, n) ──► stakeLists(owner, 0..n) ──► cache.record
//!                                                                              │
//!                                                         Complete ──► StakeList event
//! ```

use std::sync::Arc;

use alloy_primitives::Address;

use chainstake_core::cache::{AggregationKey, CacheOutcome, Generation};
use chainstake_core::chain::Chain;
use chainstake_core::error::StakeError;
use chainstake_core::event::StakeEvent;
use chainstake_core::types::StakeEntry;
use chainstake_hex::HexContract;

use crate::session::SessionShared;

/// Issues on-chain reads against a session's pool.
pub struct QueryDispatcher {
    shared: Arc<SessionShared>,
}

impl QueryDispatcher {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }

    /// Retrieve every stake of `address` on `chain`.
    ///
    /// Emits one `StakeList` once all entries are in. If the count query
    /// fails, or reports more than the session's stake limit, nothing is
    /// emitted; if some entries fail the bucket stays pending until a later
    /// `fetch_stakes` for the same key supersedes it. Among overlapping calls
    /// for one key the latest request wins, whatever order the counts
    /// arrive in.
    pub fn fetch_stakes(&self, address: Address, chain: Chain) -> Result<(), StakeError> {
        let client = self.client(chain)?;
        let generation = self.shared.cache().reserve();
        let shared = self.shared.clone();

        self.shared.spawn(async move {
            let count = match client.stake_count(address).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::warn!(session = %shared.id, %chain, %address, error = %e, "stakeCount failed");
                    return;
                }
            };
            let limit = shared.max_stakes();
            let expected = match usize::try_from(count) {
                Ok(expected) if count <= limit => expected,
                _ => {
                    tracing::warn!(session = %shared.id, %chain, %address, count, limit, "stake count over limit, retrieval dropped");
                    return;
                }
            };

            let key = AggregationKey::new(address, chain);
            let started = {
                let mut cache = shared.cache();
                if !shared.is_open() {
                    return;
                }
                cache.begin_reserved(key, generation, expected)
            };
            if !started {
                tracing::debug!(session = %shared.id, %key, "stake retrieval superseded before its count arrived");
                return;
            }
            tracing::debug!(session = %shared.id, %key, expected, "stake retrieval started");

            if expected == 0 {
                shared.deliver(StakeEvent::StakeList {
                    entries: Vec::new(),
                    address,
                    chain,
                });
                return;
            }

            for index in 0..count {
                spawn_stake_item(&shared, client.clone(), key, generation, index);
            }
        });
        Ok(())
    }

    /// Contract-wide totals for `chain`, emitted as one `GlobalInfo` event.
    pub fn fetch_global_info(&self, chain: Chain) -> Result<(), StakeError> {
        let client = self.client(chain)?;
        let shared = self.shared.clone();

        self.shared.spawn(async move {
            match client.global_info().await {
                Ok(info) => shared.deliver(StakeEvent::GlobalInfo { info, chain }),
                Err(e) => {
                    tracing::warn!(session = %shared.id, %chain, error = %e, "globalInfo failed")
                }
            }
        });
        Ok(())
    }

    /// Current HEX day on `chain`, emitted as one `CurrentDay` event.
    pub fn fetch_current_day(&self, chain: Chain) -> Result<(), StakeError> {
        let client = self.client(chain)?;
        let shared = self.shared.clone();

        self.shared.spawn(async move {
            match client.current_day().await {
                Ok(day) => shared.deliver(StakeEvent::CurrentDay { day, chain }),
                Err(e) => {
                    tracing::warn!(session = %shared.id, %chain, error = %e, "currentDay failed")
                }
            }
        });
        Ok(())
    }

    /// HEX balance of `address` on `chain`, emitted as one `Balance` event.
    pub fn fetch_balance(&self, address: Address, chain: Chain) -> Result<(), StakeError> {
        let client = self.client(chain)?;
        let shared = self.shared.clone();

        self.shared.spawn(async move {
            match client.balance_of(address).await {
                Ok(amount) => shared.deliver(StakeEvent::Balance {
                    amount,
                    address,
                    chain,
                }),
                Err(e) => {
                    tracing::warn!(session = %shared.id, %chain, %address, error = %e, "balanceOf failed")
                }
            }
        });
        Ok(())
    }

    /// Daily payout data for days `begin_day..end_day`.
    pub fn fetch_daily_data_range(
        &self,
        chain: Chain,
        begin_day: u64,
        end_day: u64,
    ) -> Result<(), StakeError> {
        if begin_day > end_day {
            return Err(StakeError::InvalidRange {
                begin: begin_day,
                end: end_day,
            });
        }
        let client = self.client(chain)?;
        let shared = self.shared.clone();

        self.shared.spawn(async move {
            match client.daily_data_range(begin_day, end_day).await {
                Ok(days) => shared.deliver(StakeEvent::DailyDataRange { days, chain }),
                Err(e) => tracing::warn!(
                    session = %shared.id,
                    %chain,
                    begin_day,
                    end_day,
                    error = %e,
                    "dailyDataRange failed"
                ),
            }
        });
        Ok(())
    }

    fn client(&self, chain: Chain) -> Result<Arc<HexContract>, StakeError> {
        self.shared.ensure_open()?;
        self.shared.pool.get(chain)
    }
}

fn spawn_stake_item(
    shared: &Arc<SessionShared>,
    client: Arc<HexContract>,
    key: AggregationKey,
    generation: Generation,
    index: u64,
) {
    let task_shared = shared.clone();
    shared.spawn(async move {
        match client.stake_at(key.address, index).await {
            Ok(entry) => record_stake(&task_shared, key, generation, entry),
            Err(e) => tracing::warn!(
                session = %task_shared.id,
                %key,
                index,
                error = %e,
                "stakeLists failed, entry dropped"
            ),
        }
    });
}

/// Insert one entry; the single caller that observes `Complete` emits.
fn record_stake(shared: &SessionShared, key: AggregationKey, generation: Generation, entry: StakeEntry) {
    let outcome = {
        let mut cache = shared.cache();
        if !shared.is_open() {
            return;
        }
        cache.record_in(&key, generation, entry)
    };

    match outcome {
        Ok(CacheOutcome::Complete(entries)) => {
            tracing::debug!(session = %shared.id, %key, count = entries.len(), "stake list complete");
            shared.deliver(StakeEvent::StakeList {
                entries,
                address: key.address,
                chain: key.chain,
            });
        }
        Ok(CacheOutcome::Pending) => {}
        Ok(CacheOutcome::Stale) => {
            tracing::debug!(session = %shared.id, %key, "late stake entry ignored")
        }
        Err(e) => tracing::debug!(session = %shared.id, %key, error = %e, "stake entry without bucket"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::StakeConfig;
    use crate::session::SessionManager;

    #[tokio::test]
    async fn released_pool_rejects_queries() {
        let manager = SessionManager::from_config(&StakeConfig::default()).unwrap();
        let (session, mut events) = manager.open().unwrap();

        assert!(session.shared.pool.close());
        let err = session
            .dispatcher()
            .fetch_balance(Address::ZERO, Chain::Ethereum)
            .unwrap_err();
        assert!(matches!(err, StakeError::PoolClosed));
        assert_eq!(session.in_flight(), 0);

        let next = tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
        assert!(next.is_err(), "no event expected");
    }

    #[tokio::test]
    async fn inverted_range_checked_before_pool() {
        let manager = SessionManager::from_config(&StakeConfig::default()).unwrap();
        let (session, _events) = manager.open().unwrap();
        session.close();

        let err = session
            .dispatcher()
            .fetch_daily_data_range(Chain::Pulsechain, 3, 1)
            .unwrap_err();
        assert!(matches!(err, StakeError::InvalidRange { begin: 3, end: 1 }));
    }
}
