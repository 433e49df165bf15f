//! In-memory memoization of batch results.
//!
//! Entries are keyed by the full parameter set plus the selection
//! fingerprint. An entry older than the TTL is never returned, and when the
//! store grows past its capacity the entry inserted first is evicted.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use log::debug;

use super::conservation::ConservationTable;
use super::valuation_calculator::{CalculatorDefaults, ValuationCalculator};
use super::valuation_model::{AppraisalParameters, ValuationResult};
use crate::settings::ValuationSettings;

/// Cache discriminator: any parameter change or selection change is a miss.
///
/// The conservation table and calculator defaults are part of the key, so
/// calculators configured differently can share one cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub parameters: AppraisalParameters,
    pub fingerprint: String,
    pub table: ConservationTable,
    pub defaults: CalculatorDefaults,
}

impl CacheKey {
    /// Key for a calculator with the default table and defaults.
    pub fn new(parameters: AppraisalParameters, fingerprint: impl Into<String>) -> Self {
        Self::for_calculator(&ValuationCalculator::default(), parameters, fingerprint)
    }

    pub fn for_calculator(
        calculator: &ValuationCalculator,
        parameters: AppraisalParameters,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            parameters,
            fingerprint: fingerprint.into(),
            table: calculator.engine().table().clone(),
            defaults: calculator.defaults().clone(),
        }
    }
}

/// A stored batch; replaced on re-store, never updated in place.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub results: Vec<ValuationResult>,
    pub created_at: DateTime<Utc>,
}

/// Swappable store for computed batches.
///
/// Implementations must keep insertion and eviction atomic with respect to
/// concurrent callers.
pub trait ResultCacheTrait: Send + Sync {
    /// Returns the results stored for `key` if they have not expired.
    fn lookup(&self, key: &CacheKey) -> Option<Vec<ValuationResult>>;

    /// Stores `results` under `key`, replacing any previous entry.
    fn store(&self, key: CacheKey, results: Vec<ValuationResult>);

    /// Removes the entry for `key`. Returns true if one was present.
    fn evict(&self, key: &CacheKey) -> bool;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded, time-expiring cache with insertion-order eviction.
pub struct InMemoryResultCache {
    ttl: Duration,
    capacity: usize,
    // Front is the oldest insertion
    entries: Mutex<VecDeque<CacheEntry>>,
}

impl InMemoryResultCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1) + 1)),
        }
    }

    pub fn from_settings(settings: &ValuationSettings) -> Self {
        Self::new(settings.cache_ttl(), settings.cache_capacity)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lookup as of `now`. Expired entries are dropped before searching.
    pub fn lookup_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Vec<ValuationResult>> {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| !self.is_expired(entry, now));
        if entries.len() < before {
            debug!("Evicted {} expired valuation batch(es)", before - entries.len());
        }
        entries
            .iter()
            .find(|entry| &entry.key == key)
            .map(|entry| entry.results.clone())
    }

    /// Store as of `now`, evicting the oldest entry when over capacity.
    pub fn store_at(&self, key: CacheKey, results: Vec<ValuationResult>, now: DateTime<Utc>) {
        let mut entries = self.entries();
        entries.retain(|entry| entry.key != key);
        entries.push_back(CacheEntry {
            key,
            results,
            created_at: now,
        });
        while entries.len() > self.capacity {
            if let Some(evicted) = entries.pop_front() {
                debug!(
                    "Result cache over capacity; evicted batch {} created at {}",
                    evicted.key.fingerprint, evicted.created_at
                );
            }
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at >= self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryResultCache {
    fn default() -> Self {
        Self::from_settings(&ValuationSettings::default())
    }
}

impl ResultCacheTrait for InMemoryResultCache {
    fn lookup(&self, key: &CacheKey) -> Option<Vec<ValuationResult>> {
        self.lookup_at(key, Utc::now())
    }

    fn store(&self, key: CacheKey, results: Vec<ValuationResult>) {
        self.store_at(key, results, Utc::now());
    }

    fn evict(&self, key: &CacheKey) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| &entry.key != key);
        entries.len() < before
    }

    fn clear(&self) {
        self.entries().clear();
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}
