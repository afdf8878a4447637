use crate::executor;
use crate::listener::ListenerRegistry;
use crate::loader::Loaders;
use crate::sweeper::{Sweeper, SHUTDOWN_GRACE};
use crate::utils::total_weight;
use crate::{
    CacheConfig, CacheEntry, CacheError, CacheStats, EntryStore, EvictionReason, EvictionStrategy,
    ListenerId, Result, SharedListener,
};
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

/// A concurrent in-process key/value cache.
///
/// `Cache` is a cheap handle: clones share the same entries, statistics and
/// listeners. The cache is closed (its background sweeper stopped) when
/// [`close`](Self::close) is called or when the last handle is dropped.
///
/// Every operation runs on the calling thread. There is no lock around the
/// whole cache: operations on different keys proceed in parallel, and a
/// compound operation such as `put` (replace, notify, bound) is not atomic as a
/// whole. Under concurrent writers the configured bounds may be exceeded
/// briefly.
///
/// # Type Parameters
///
/// * `K` - Key type
/// * `V` - Value type, cloned out on reads
///
/// # Examples
///
/// ```
/// use stratocache_core::{Cache, CacheConfig, EvictionPolicy};
///
/// let config = CacheConfig::builder()
///     .maximum_size(2)
///     .eviction_policy(EvictionPolicy::LRU)
///     .build()
///     .unwrap();
/// let cache = Cache::new(config);
///
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.get(&"a"), Some(1));
///
/// // "b" is now the least recently used entry
/// cache.put("c", 3);
/// assert!(!cache.contains_key(&"b"));
/// assert_eq!(cache.size(), 2);
/// assert_eq!(cache.stats().evictions(), 1);
/// ```
pub struct Cache<K, V>
where
    K: Eq + Hash,
{
    inner: Arc<CacheInner<K, V>>,
}

struct CacheInner<K, V>
where
    K: Eq + Hash,
{
    config: CacheConfig<K, V>,
    entries: EntryStore<K, V>,
    strategy: EvictionStrategy<K>,
    stats: CacheStats,
    listeners: ListenerRegistry<K, V>,
    executor: Handle,
    sweeper: Mutex<Option<Sweeper>>,
    refreshing: DashSet<K>,
    closed: AtomicBool,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache from a validated configuration.
    ///
    /// Starts the background sweeper when `refresh_after_write` is configured.
    pub fn new(config: CacheConfig<K, V>) -> Self {
        let entries =
            DashMap::with_capacity_and_shard_amount(config.initial_capacity(), config.shard_amount());
        let strategy =
            EvictionStrategy::from_policy(config.eviction_policy(), config.maximum_weight());
        let listeners = ListenerRegistry::new(config.listeners().iter().cloned());
        let executor = executor::resolve(config.executor());

        let inner = Arc::new(CacheInner {
            config,
            entries,
            strategy,
            stats: CacheStats::new(),
            listeners,
            executor,
            sweeper: Mutex::new(None),
            refreshing: DashSet::new(),
            closed: AtomicBool::new(false),
        });

        if inner.config.refresh_after_write().is_some() {
            CacheInner::start_sweeper(&inner);
        }

        debug!(
            policy = inner.strategy.name(),
            maximum_size = ?inner.config.maximum_size(),
            maximum_weight = ?inner.config.maximum_weight(),
            "cache created"
        );

        Self { inner }
    }

    /// Returns the value for `key`.
    ///
    /// * Live entry: records the access and a hit, returns the value.
    /// * Expired entry: removes it, emits `on_expire`, records a miss and
    ///   returns `None`. The loader is not consulted.
    /// * Absent entry: records a miss, then invokes the configured loader, if
    ///   any. A loader failure is recorded and reported to listeners but never
    ///   returned; the call yields `None`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    /// Stores `value` under `key`, replacing any previous entry, then evicts
    /// until the configured bounds hold again.
    pub fn put(&self, key: K, value: V) {
        self.inner.put(key, value);
    }

    /// Removes `key` and returns its value. Absent keys are a silent no-op.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }

    /// Removes every entry and strategy metadata and emits a single `on_clear`.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Returns `true` if `key` has a live (unexpired) entry.
    ///
    /// An expired entry the sweeper has not removed yet reports `false`, while
    /// [`size`](Self::size) still counts it. No statistics or events are
    /// recorded.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Number of stored entries, including expired entries not yet removed.
    pub fn size(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Sum of the weights of all stored entries.
    pub fn weighted_size(&self) -> u64 {
        total_weight(&self.inner.entries)
    }

    /// Keys of the live entries, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.inner.collect_live(|key, _| key.clone())
    }

    /// Values of the live entries, in no particular order.
    pub fn values(&self) -> Vec<V> {
        self.inner.collect_live(|_, entry| entry.value().clone())
    }

    /// Read-only key/value pairs of the live entries.
    pub fn entries(&self) -> Vec<CacheEntryView<K, V>> {
        self.inner.collect_live(|key, entry| CacheEntryView {
            key: key.clone(),
            value: entry.value().clone(),
        })
    }

    /// Calls `action` for each live entry.
    ///
    /// `action` runs while a shard of the store is read-locked and must not
    /// write to this cache.
    pub fn for_each(&self, mut action: impl FnMut(&K, &V)) {
        let now = Instant::now();
        for item in self.inner.entries.iter() {
            if !item.value().is_expired_at(now) {
                action(item.key(), item.value().value());
            }
        }
    }

    /// Returns the live value for `key`, or computes, stores and returns one.
    ///
    /// Goes through [`get`](Self::get) first, so a configured loader runs
    /// before `compute`.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.put(key, value.clone());
        value
    }

    /// Returns the value for `key`, or `default` if there is none.
    pub fn get_or_default(&self, key: &K, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Returns a snapshot of the statistics.
    ///
    /// The snapshot does not change afterwards. All counters stay at zero when
    /// `record_stats` is disabled.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    /// Zeroes the live statistics counters.
    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }

    pub fn config(&self) -> &CacheConfig<K, V> {
        &self.inner.config
    }

    /// Registers a listener and returns a handle for removing it.
    pub fn add_listener(&self, listener: SharedListener<K, V>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    /// Removes a listener registered with [`add_listener`](Self::add_listener)
    /// or at build time. Returns `false` if it was already gone.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Runs [`get`](Self::get) on the cache's executor.
    ///
    /// Async operations on the same key are not ordered with respect to each
    /// other.
    pub fn get_async(&self, key: K) -> JoinHandle<Option<V>> {
        let inner = Arc::clone(&self.inner);
        self.inner.executor.spawn_blocking(move || inner.get(&key))
    }

    /// Runs [`put`](Self::put) on the cache's executor.
    pub fn put_async(&self, key: K, value: V) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .executor
            .spawn_blocking(move || inner.put(key, value))
    }

    /// Runs [`remove`](Self::remove) on the cache's executor.
    pub fn remove_async(&self, key: K) -> JoinHandle<Option<V>> {
        let inner = Arc::clone(&self.inner);
        self.inner.executor.spawn_blocking(move || inner.remove(&key))
    }

    /// Runs [`clear`](Self::clear) on the cache's executor.
    pub fn clear_async(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.inner.executor.spawn_blocking(move || inner.clear())
    }

    /// Stops the background sweeper, waiting up to one second for it.
    ///
    /// Idempotent. In-flight loads and refreshes are not waited for, and the
    /// cache stays usable for foreground operations.
    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl<K, V> CacheInner<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn start_sweeper(this: &Arc<Self>) {
        let weak = Arc::downgrade(this);
        let started = Sweeper::start(this.config.sweep_interval(), move || match weak.upgrade() {
            Some(inner) => {
                inner.sweep();
                true
            }
            None => false,
        });
        match started {
            Ok(sweeper) => *this.sweeper.lock() = Some(sweeper),
            Err(err) => error!(error = %err, "failed to start sweeper, refresh disabled"),
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        // clone the entry out so the shard lock is released before anything else
        let found = self.entries.get(key).map(|e| Arc::clone(e.value()));
        match found {
            Some(entry) if entry.is_expired() => {
                self.expire(key, &entry);
                self.record(CacheStats::record_miss);
                None
            }
            Some(entry) => {
                entry.record_access();
                if self.config.expire_after_write().is_none() {
                    if let Some(ttl) = self.config.expire_after_access() {
                        entry.extend_expiration(ttl);
                    }
                }
                self.strategy.record_access(key, &entry);
                self.record(CacheStats::record_hit);
                Some(entry.value().clone())
            }
            None => {
                self.record(CacheStats::record_miss);
                self.load(key)
            }
        }
    }

    fn put(&self, key: K, value: V) {
        let entry = Arc::new(self.new_entry(&key, value));
        let previous = self.entries.insert(key.clone(), Arc::clone(&entry));

        if let Some(previous) = previous {
            self.listeners.remove_event(&key, previous.value());
        }
        self.listeners.put(&key, entry.value());
        self.strategy.record_access(&key, &entry);

        self.evict_if_needed();
    }

    fn new_entry(&self, key: &K, value: V) -> CacheEntry<V> {
        let weight = self.config.weigher().map_or(1, |weigher| weigher(key, &value));
        let ttl = self
            .config
            .expire_after_write()
            .or(self.config.expire_after_access());
        // an instant past the end of time means never
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        CacheEntry::new(value, weight, expires_at)
    }

    fn remove(&self, key: &K) -> Option<V> {
        let (key, entry) = self.entries.remove(key)?;
        self.listeners.remove_event(&key, entry.value());
        self.strategy.remove(&key);
        Some(Arc::try_unwrap(entry).map_or_else(|shared| shared.value().clone(), CacheEntry::into_value))
    }

    fn clear(&self) {
        self.entries.clear();
        self.strategy.clear();
        self.listeners.clear();
        trace!("cache cleared");
    }

    fn collect_live<T>(&self, mut project: impl FnMut(&K, &CacheEntry<V>) -> T) -> Vec<T> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|item| !item.value().is_expired_at(now))
            .map(|item| project(item.key(), item.value()))
            .collect()
    }

    /// Evicts until the size and weight bounds hold, or until the strategy
    /// has no candidate left.
    fn evict_if_needed(&self) {
        if let Some(maximum) = self.config.maximum_size() {
            while self.entries.len() as u64 > maximum {
                if !self.evict(EvictionReason::Size) {
                    break;
                }
            }
        }
        if let Some(maximum) = self.config.maximum_weight() {
            while total_weight(&self.entries) > maximum {
                if !self.evict(EvictionReason::Weight) {
                    break;
                }
            }
        }
    }

    /// Removes the strategy's candidate. Returns `false` if nothing was evicted.
    fn evict(&self, reason: EvictionReason) -> bool {
        let Some(candidate) = self.strategy.select_candidate(&self.entries) else {
            trace!(policy = self.strategy.name(), %reason, "no eviction candidate");
            return false;
        };
        let Some((key, entry)) = self.entries.remove(&candidate) else {
            return false;
        };
        self.strategy.remove(&key);
        self.record(CacheStats::record_eviction);
        debug!(policy = self.strategy.name(), %reason, weight = entry.weight(), "evicted entry");
        self.listeners.evict(&key, entry.value(), reason);
        true
    }

    /// Removes `entry` if it is still the one stored under `key`.
    fn expire(&self, key: &K, entry: &Arc<CacheEntry<V>>) -> bool {
        let removed = self
            .entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, entry));
        let Some((key, entry)) = removed else {
            return false;
        };
        self.strategy.remove(&key);
        trace!("entry expired");
        self.listeners.expire(&key, entry.value());
        true
    }

    fn loaders(&self) -> Loaders<'_, K, V> {
        Loaders {
            sync: self.config.loader(),
            async_: self.config.async_loader(),
        }
    }

    fn load(&self, key: &K) -> Option<V> {
        let started = Instant::now();
        match self.loaders().load(key, &self.executor)? {
            Ok(Some(value)) => {
                let elapsed = started.elapsed();
                self.put(key.clone(), value.clone());
                self.record(|stats| stats.record_load(elapsed));
                self.listeners.load(key, &value);
                Some(value)
            }
            Ok(None) => None,
            Err(err) => {
                self.record(CacheStats::record_load_failure);
                warn!(error = %err, "loader failed");
                self.listeners.load_error(key, err.as_ref());
                None
            }
        }
    }

    /// One sweeper cycle: expire stale entries and schedule refreshes.
    fn sweep(self: &Arc<Self>) {
        let now = Instant::now();
        let snapshot: Vec<(K, Arc<CacheEntry<V>>)> = self
            .entries
            .iter()
            .map(|item| (item.key().clone(), Arc::clone(item.value())))
            .collect();

        let refresh_after = self
            .config
            .refresh_after_write()
            .filter(|_| !self.loaders().is_empty());
        let mut expired = 0usize;
        let mut scheduled = 0usize;

        for (key, entry) in snapshot {
            if entry.is_expired_at(now) {
                if self.expire(&key, &entry) {
                    expired += 1;
                }
                continue;
            }
            let Some(refresh_after) = refresh_after else {
                continue;
            };
            if entry.age() > refresh_after && self.refreshing.insert(key.clone()) {
                self.schedule_refresh(key);
                scheduled += 1;
            }
        }

        if expired > 0 || scheduled > 0 {
            debug!(expired, scheduled, "sweep finished");
        }
    }

    fn schedule_refresh(self: &Arc<Self>, key: K) {
        // a pending refresh must not keep a dropped cache alive
        let weak = Arc::downgrade(self);
        // fire and forget; the handle is dropped
        drop(self.executor.spawn_blocking(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.entries.contains_key(&key) {
                inner.load(&key);
            }
            inner.refreshing.remove(&key);
        }));
    }

    fn record(&self, update: impl FnOnce(&CacheStats)) {
        if self.config.record_stats() {
            update(&self.stats);
        }
    }
}

impl<K, V> CacheInner<K, V>
where
    K: Eq + Hash,
{
    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let sweeper = self.sweeper.lock().take();
        if let Some(mut sweeper) = sweeper {
            sweeper.stop(SHUTDOWN_GRACE);
        }
        debug!("cache closed");
    }
}

impl<K, V> Drop for CacheInner<K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.close();
    }
}

impl<K, V> Clone for Cache<K, V>
where
    K: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("size", &self.inner.entries.len())
            .field("policy", &self.inner.config.eviction_policy())
            .field("listeners", &self.inner.listeners.len())
            .field("closed", &self.inner.closed.load(Ordering::Acquire))
            .field(
                "sweeping",
                &self.inner.sweeper.lock().as_ref().is_some_and(Sweeper::is_running),
            )
            .finish()
    }
}

/// A read-only key/value pair returned by [`Cache::entries`].
///
/// The pair is a copy taken when `entries` was called; it cannot write back
/// to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryView<K, V> {
    key: K,
    value: V,
}

impl<K, V> CacheEntryView<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Always fails: the entries view is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unsupported`].
    pub fn set_value(&mut self, _value: V) -> Result<V> {
        Err(CacheError::Unsupported("cache entry views are read-only"))
    }
}
