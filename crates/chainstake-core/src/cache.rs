//! Per-session accumulator for partial stake lists.
//!
//! A stake retrieval learns the expected number of stakes from
//! `stakeCount`, then receives one [`StakeEntry`] per `stakeLists` call in
//! arbitrary order. The cache buckets those entries per
//! [`AggregationKey`] and reports completion exactly once, the moment the
//! bucket holds `expected` distinct stake ids.
//!
//! Lifecycle of a key:
//! - `begin`  → bucket created (or replaced) under a fresh [`Generation`]
//! - `record` → `Pending` until full, then `Complete` (bucket removed)
//! - `record` after completion, or for a superseded generation → `Stale`

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::Address;

use crate::chain::Chain;
use crate::error::StakeError;
use crate::types::StakeEntry;

/// Bucket identity: one address on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    pub address: Address,
    pub chain: Chain,
}

impl AggregationKey {
    pub fn new(address: Address, chain: Chain) -> Self {
        Self { address, chain }
    }
}

impl std::fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.address, self.chain)
    }
}

/// Retrieval cycle number handed out by [`StakeAggregationCache::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Result of recording one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Bucket still short of its expected count.
    Pending,
    /// Bucket just filled; entries are drained, sorted by stake id.
    Complete(Vec<StakeEntry>),
    /// Late or duplicate delivery for a finished or superseded cycle.
    Stale,
}

struct Bucket {
    generation: Generation,
    expected: usize,
    entries: BTreeMap<u64, StakeEntry>,
}

/// Accumulates stake entries per key until each bucket is complete.
///
/// Not internally synchronised; the owning session wraps it in a mutex so
/// that insert-and-check-complete is one critical section.
#[derive(Default)]
pub struct StakeAggregationCache {
    buckets: HashMap<AggregationKey, Bucket>,
    /// Last finalized generation per key, used to classify late deliveries.
    /// Kept until `clear`, so it grows with the distinct keys a session queries.
    finalized: HashMap<AggregationKey, Generation>,
    next_generation: u64,
}

impl StakeAggregationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a retrieval cycle for `key`, discarding any incomplete bucket.
    ///
    /// With `expected == 0` the cycle is finalized immediately and no bucket
    /// is kept; the caller emits the empty list itself.
    pub fn begin(&mut self, key: AggregationKey, expected: usize) -> Generation {
        let generation = self.reserve();
        self.begin_reserved(key, generation, expected);
        generation
    }

    /// Hand out the next generation without touching any bucket.
    ///
    /// Reserving at request time makes request order, not response order,
    /// decide which cycle for a key is the newest.
    pub fn reserve(&mut self) -> Generation {
        self.next_generation += 1;
        Generation(self.next_generation)
    }

    /// Start the reserved cycle `generation` for `key`.
    ///
    /// Returns `false` and changes nothing when a later cycle for `key` has
    /// already started or finished.
    pub fn begin_reserved(
        &mut self,
        key: AggregationKey,
        generation: Generation,
        expected: usize,
    ) -> bool {
        let newest = self
            .current_generation(&key)
            .max(self.finalized.get(&key).copied());
        if newest.is_some_and(|g| g > generation) {
            return false;
        }

        if let Some(old) = self.buckets.remove(&key) {
            tracing::debug!(
                key = %key,
                received = old.entries.len(),
                expected = old.expected,
                "superseding incomplete stake bucket"
            );
        }

        if expected == 0 {
            self.finalized.insert(key, generation);
        } else {
            self.finalized.remove(&key);
            self.buckets.insert(
                key,
                Bucket {
                    generation,
                    expected,
                    entries: BTreeMap::new(),
                },
            );
        }
        true
    }

    /// Record `entry` into the current cycle for `key`.
    pub fn record(
        &mut self,
        key: &AggregationKey,
        entry: StakeEntry,
    ) -> Result<CacheOutcome, StakeError> {
        match self.current_generation(key) {
            Some(generation) => self.record_in(key, generation, entry),
            None if self.finalized.contains_key(key) => Ok(CacheOutcome::Stale),
            None => Err(Self::unknown(key)),
        }
    }

    /// Record `entry` on behalf of the cycle `generation`.
    ///
    /// Deliveries for an older generation than the live bucket are `Stale`
    /// and never count toward the newer cycle.
    pub fn record_in(
        &mut self,
        key: &AggregationKey,
        generation: Generation,
        entry: StakeEntry,
    ) -> Result<CacheOutcome, StakeError> {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return match self.finalized.get(key) {
                Some(done) if generation <= *done => Ok(CacheOutcome::Stale),
                _ => Err(Self::unknown(key)),
            };
        };

        if generation < bucket.generation {
            return Ok(CacheOutcome::Stale);
        }
        if generation > bucket.generation {
            return Err(Self::unknown(key));
        }

        bucket.entries.insert(entry.stake_id, entry);
        if bucket.entries.len() < bucket.expected {
            return Ok(CacheOutcome::Pending);
        }

        let Some(bucket) = self.buckets.remove(key) else {
            return Err(Self::unknown(key));
        };
        self.finalized.insert(*key, bucket.generation);
        Ok(CacheOutcome::Complete(bucket.entries.into_values().collect()))
    }

    /// Generation of the live bucket for `key`, if one exists.
    pub fn current_generation(&self, key: &AggregationKey) -> Option<Generation> {
        self.buckets.get(key).map(|b| b.generation)
    }

    /// Number of distinct entries received so far for `key`'s live bucket.
    pub fn received(&self, key: &AggregationKey) -> Option<usize> {
        self.buckets.get(key).map(|b| b.entries.len())
    }

    /// Number of buckets still waiting for entries.
    pub fn pending_len(&self) -> usize {
        self.buckets.len()
    }

    /// Drop every bucket and finalization record.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.finalized.clear();
    }

    fn unknown(key: &AggregationKey) -> StakeError {
        StakeError::UnknownKey {
            address: key.address,
            chain: key.chain,
        }
    }
}
