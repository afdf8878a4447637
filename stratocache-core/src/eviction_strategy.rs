use crate::utils::{find_max_key, find_min_key};
use crate::{CacheEntry, EvictionPolicy};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The concurrent map holding a cache's entries.
///
/// Values are reference-counted so readers can clone an entry out and release
/// the shard lock before doing anything else with it.
pub type EntryStore<K, V> = DashMap<K, Arc<CacheEntry<V>>>;

/// Stateful eviction strategy built from an [`EvictionPolicy`].
///
/// Each variant owns a metadata map from key to a strategy-specific scalar,
/// kept apart from the entry store. The cache keeps the two in step on a best
/// effort basis: a key may briefly exist in one and not the other while
/// concurrent operations are in flight, and each variant documents how such a
/// key is ranked.
///
/// All methods take `&self`; concurrent `record_access` calls for the same key
/// are last-write-wins.
///
/// # Examples
///
/// ```
/// use dashmap::DashMap;
/// use std::sync::Arc;
/// use stratocache_core::{CacheEntry, EntryStore, EvictionPolicy, EvictionStrategy};
///
/// let store: EntryStore<&str, i32> = DashMap::new();
/// let strategy = EvictionStrategy::from_policy(&EvictionPolicy::LRU, None);
///
/// for key in ["a", "b"] {
///     let entry = Arc::new(CacheEntry::new(0, 1, None));
///     store.insert(key, entry.clone());
///     strategy.record_access(&key, &entry);
/// }
///
/// // touch "a" again, so "b" becomes least recently used
/// let a = store.get("a").map(|e| e.value().clone()).unwrap();
/// strategy.record_access(&"a", &a);
///
/// assert_eq!(strategy.select_candidate(&store), Some("b"));
/// ```
#[derive(Debug)]
pub enum EvictionStrategy<K>
where
    K: Eq + Hash,
{
    Lru(AccessOrder<K>),
    Mru(AccessOrder<K>),
    Lfu(AccessFrequency<K>),
    Fifo(InsertionOrder<K>),
    Filo(InsertionOrder<K>),
    IdleTime(IdleTracker<K>),
    Weight(WeightTracker<K>),
    Composite(Vec<EvictionStrategy<K>>),
}

impl<K> EvictionStrategy<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty strategy for the given policy.
    ///
    /// `maximum_weight` bounds the weight-based variant (also when nested in a
    /// composite); other variants ignore it.
    pub fn from_policy(policy: &EvictionPolicy, maximum_weight: Option<u64>) -> Self {
        match policy {
            EvictionPolicy::LRU => EvictionStrategy::Lru(AccessOrder::new()),
            EvictionPolicy::MRU => EvictionStrategy::Mru(AccessOrder::new()),
            EvictionPolicy::LFU => EvictionStrategy::Lfu(AccessFrequency::new()),
            EvictionPolicy::FIFO => EvictionStrategy::Fifo(InsertionOrder::new()),
            EvictionPolicy::FILO => EvictionStrategy::Filo(InsertionOrder::new()),
            EvictionPolicy::IdleTime(threshold) => {
                EvictionStrategy::IdleTime(IdleTracker::new(*threshold))
            }
            EvictionPolicy::Weight => EvictionStrategy::Weight(WeightTracker::new(maximum_weight)),
            EvictionPolicy::Composite(policies) => EvictionStrategy::Composite(
                policies
                    .iter()
                    .map(|p| EvictionStrategy::from_policy(p, maximum_weight))
                    .collect(),
            ),
        }
    }

    /// Nominates one key of `entries` for eviction, or `None` if no entry is
    /// eligible.
    pub fn select_candidate<V>(&self, entries: &EntryStore<K, V>) -> Option<K> {
        match self {
            // untouched keys rank as oldest
            EvictionStrategy::Lru(order) => {
                find_min_key(entries, |k, _| Some(order.tick(k).unwrap_or(0)))
            }
            EvictionStrategy::Mru(order) => {
                find_max_key(entries, |k, _| Some(order.tick(k).unwrap_or(0)))
            }
            // keys not yet counted are being inserted; rank them last
            EvictionStrategy::Lfu(freq) => {
                find_min_key(entries, |k, _| Some(freq.count(k).unwrap_or(u64::MAX)))
            }
            EvictionStrategy::Fifo(order) => {
                find_min_key(entries, |k, _| Some(order.index(k).unwrap_or(u64::MAX)))
            }
            EvictionStrategy::Filo(order) => {
                find_max_key(entries, |k, _| Some(order.index(k).unwrap_or(0)))
            }
            EvictionStrategy::IdleTime(idle) => {
                let now = Instant::now();
                find_max_key(entries, |k, _| idle.idle_for(k, now))
            }
            EvictionStrategy::Weight(weights) => {
                find_max_key(entries, |k, _| Some(weights.weight(k).unwrap_or(0)))
            }
            EvictionStrategy::Composite(strategies) => strategies
                .iter()
                .find_map(|strategy| strategy.select_candidate(entries)),
        }
    }

    /// Records a read or write of `key`.
    pub fn record_access<V>(&self, key: &K, entry: &CacheEntry<V>) {
        match self {
            EvictionStrategy::Lru(order) | EvictionStrategy::Mru(order) => order.touch(key),
            EvictionStrategy::Lfu(freq) => freq.increment(key),
            EvictionStrategy::Fifo(order) | EvictionStrategy::Filo(order) => order.admit(key),
            EvictionStrategy::IdleTime(idle) => idle.touch(key),
            EvictionStrategy::Weight(weights) => weights.update(key, entry.weight()),
            EvictionStrategy::Composite(strategies) => {
                for strategy in strategies {
                    strategy.record_access(key, entry);
                }
            }
        }
    }

    /// Drops the metadata kept for `key`.
    pub fn remove(&self, key: &K) {
        match self {
            EvictionStrategy::Lru(order) | EvictionStrategy::Mru(order) => order.remove(key),
            EvictionStrategy::Lfu(freq) => freq.remove(key),
            EvictionStrategy::Fifo(order) | EvictionStrategy::Filo(order) => order.remove(key),
            EvictionStrategy::IdleTime(idle) => idle.remove(key),
            EvictionStrategy::Weight(weights) => weights.remove(key),
            EvictionStrategy::Composite(strategies) => {
                for strategy in strategies {
                    strategy.remove(key);
                }
            }
        }
    }

    /// Drops all metadata.
    pub fn clear(&self) {
        match self {
            EvictionStrategy::Lru(order) | EvictionStrategy::Mru(order) => order.clear(),
            EvictionStrategy::Lfu(freq) => freq.clear(),
            EvictionStrategy::Fifo(order) | EvictionStrategy::Filo(order) => order.clear(),
            EvictionStrategy::IdleTime(idle) => idle.clear(),
            EvictionStrategy::Weight(weights) => weights.clear(),
            EvictionStrategy::Composite(strategies) => {
                for strategy in strategies {
                    strategy.clear();
                }
            }
        }
    }

    /// Number of keys with metadata. A composite reports its largest member.
    pub fn tracked_len(&self) -> usize {
        match self {
            EvictionStrategy::Lru(order) | EvictionStrategy::Mru(order) => order.ticks.len(),
            EvictionStrategy::Lfu(freq) => freq.counts.len(),
            EvictionStrategy::Fifo(order) | EvictionStrategy::Filo(order) => order.indexes.len(),
            EvictionStrategy::IdleTime(idle) => idle.touches.len(),
            EvictionStrategy::Weight(weights) => weights.weights.len(),
            EvictionStrategy::Composite(strategies) => strategies
                .iter()
                .map(EvictionStrategy::tracked_len)
                .max()
                .unwrap_or(0),
        }
    }

    /// Short lowercase name of the strategy, used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            EvictionStrategy::Lru(_) => "lru",
            EvictionStrategy::Mru(_) => "mru",
            EvictionStrategy::Lfu(_) => "lfu",
            EvictionStrategy::Fifo(_) => "fifo",
            EvictionStrategy::Filo(_) => "filo",
            EvictionStrategy::IdleTime(_) => "idle",
            EvictionStrategy::Weight(_) => "weight",
            EvictionStrategy::Composite(_) => "composite",
        }
    }

    /// Returns the weight tracker, if this strategy is (or contains) one.
    pub fn weight_tracker(&self) -> Option<&WeightTracker<K>> {
        match self {
            EvictionStrategy::Weight(weights) => Some(weights),
            EvictionStrategy::Composite(strategies) => {
                strategies.iter().find_map(EvictionStrategy::weight_tracker)
            }
            _ => None,
        }
    }
}

/// Recency metadata shared by LRU and MRU: a logical clock value per key.
#[derive(Debug)]
pub struct AccessOrder<K>
where
    K: Eq + Hash,
{
    ticks: DashMap<K, u64>,
    clock: AtomicU64,
}

impl<K> AccessOrder<K>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            ticks: DashMap::new(),
            clock: AtomicU64::new(0),
        }
    }

    fn touch(&self, key: &K) {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        self.ticks.insert(key.clone(), tick);
    }

    /// Logical time of the last access to `key`.
    pub fn tick(&self, key: &K) -> Option<u64> {
        self.ticks.get(key).map(|t| *t)
    }

    fn remove(&self, key: &K) {
        self.ticks.remove(key);
    }

    fn clear(&self) {
        self.ticks.clear();
    }
}

/// LFU metadata: number of accesses per key.
#[derive(Debug)]
pub struct AccessFrequency<K>
where
    K: Eq + Hash,
{
    counts: DashMap<K, u64>,
}

impl<K> AccessFrequency<K>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            counts: DashMap::new(),
        }
    }

    fn increment(&self, key: &K) {
        *self.counts.entry(key.clone()).or_insert(0) += 1;
    }

    /// Accesses recorded for `key` since it was last removed.
    pub fn count(&self, key: &K) -> Option<u64> {
        self.counts.get(key).map(|c| *c)
    }

    fn remove(&self, key: &K) {
        self.counts.remove(key);
    }

    fn clear(&self) {
        self.counts.clear();
    }
}

/// FIFO/FILO metadata: the insertion index assigned when a key is first seen.
#[derive(Debug)]
pub struct InsertionOrder<K>
where
    K: Eq + Hash,
{
    indexes: DashMap<K, u64>,
    next: AtomicU64,
}

impl<K> InsertionOrder<K>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            indexes: DashMap::new(),
            next: AtomicU64::new(1),
        }
    }

    // a key keeps its index until removed, so re-puts do not reorder it
    fn admit(&self, key: &K) {
        self.indexes
            .entry(key.clone())
            .or_insert_with(|| self.next.fetch_add(1, Ordering::Relaxed));
    }

    /// Insertion index of `key`, starting at 1.
    pub fn index(&self, key: &K) -> Option<u64> {
        self.indexes.get(key).map(|i| *i)
    }

    fn remove(&self, key: &K) {
        self.indexes.remove(key);
    }

    fn clear(&self) {
        self.indexes.clear();
    }
}

/// Idle-time metadata: the instant each key was last touched.
///
/// Only keys idle for at least the threshold are eligible; the most idle of
/// them is evicted. A key without a recorded touch counts as idle forever.
#[derive(Debug)]
pub struct IdleTracker<K>
where
    K: Eq + Hash,
{
    threshold: Duration,
    touches: DashMap<K, Instant>,
}

impl<K> IdleTracker<K>
where
    K: Eq + Hash + Clone,
{
    fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            touches: DashMap::new(),
        }
    }

    /// The minimum idle duration that makes a key eligible.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    fn touch(&self, key: &K) {
        self.touches.insert(key.clone(), Instant::now());
    }

    /// How long `key` has been idle at `now`, or `None` if it is not yet
    /// eligible for eviction.
    pub fn idle_for(&self, key: &K, now: Instant) -> Option<Duration> {
        let idle = match self.touches.get(key) {
            Some(touched) => now.saturating_duration_since(*touched),
            None => Duration::MAX,
        };
        (idle >= self.threshold).then_some(idle)
    }

    fn remove(&self, key: &K) {
        self.touches.remove(key);
    }

    fn clear(&self) {
        self.touches.clear();
    }
}

/// Weight metadata: each key's weight plus a running total.
///
/// The running total is maintained incrementally and is approximate while
/// writers race; the cache checks its weight bound against a full scan of the
/// store instead.
#[derive(Debug)]
pub struct WeightTracker<K>
where
    K: Eq + Hash,
{
    weights: DashMap<K, u64>,
    total: AtomicU64,
    maximum: Option<u64>,
}

impl<K> WeightTracker<K>
where
    K: Eq + Hash + Clone,
{
    fn new(maximum: Option<u64>) -> Self {
        Self {
            weights: DashMap::new(),
            total: AtomicU64::new(0),
            maximum,
        }
    }

    fn update(&self, key: &K, weight: u64) {
        // the total is adjusted under the shard lock so a concurrent remove
        // of the same key always subtracts a weight that was already added
        match self.weights.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(weight);
                self.total.fetch_add(weight, Ordering::Relaxed);
                self.total.fetch_sub(previous, Ordering::Relaxed);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(weight);
                self.total.fetch_add(weight, Ordering::Relaxed);
            }
        }
    }

    /// Last recorded weight of `key`.
    pub fn weight(&self, key: &K) -> Option<u64> {
        self.weights.get(key).map(|w| *w)
    }

    /// Sum of the weights of all tracked keys.
    pub fn current_weight(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Returns `true` if a maximum is configured and the running total exceeds it.
    pub fn is_over_weight(&self) -> bool {
        matches!(self.maximum, Some(max) if self.current_weight() > max)
    }

    fn remove(&self, key: &K) {
        if let Some((_, weight)) = self.weights.remove(key) {
            self.total.fetch_sub(weight, Ordering::Relaxed);
        }
    }

    fn clear(&self) {
        self.weights.clear();
        self.total.store(0, Ordering::Relaxed);
    }
}
