use crate::{
    AsyncLoader, BoxError, CacheError, EvictionPolicy, Loader, Result, SharedListener, Weigher,
};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

const DEFAULT_INITIAL_CAPACITY: usize = 16;
const DEFAULT_CONCURRENCY_LEVEL: usize = 16;
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Immutable, validated cache configuration.
///
/// Built with [`CacheConfig::builder`]; validation happens in
/// [`CacheConfigBuilder::build`], so every `CacheConfig` that exists is usable.
///
/// # Defaults
///
/// | Option               | Default                |
/// |----------------------|------------------------|
/// | `maximum_size`       | unbounded              |
/// | `maximum_weight`     | unbounded              |
/// | `weigher`            | every entry weighs 1   |
/// | `expire_after_write` | never                  |
/// | `expire_after_access`| never                  |
/// | `refresh_after_write`| never (no sweeper)     |
/// | `eviction_policy`    | [`EvictionPolicy::LRU`]|
/// | `record_stats`       | `true`                 |
/// | `initial_capacity`   | 16                     |
/// | `concurrency_level`  | 16                     |
/// | `sweep_interval`     | 1 second               |
/// | `executor`           | shared default runtime |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use stratocache_core::{CacheConfig, EvictionPolicy};
///
/// let config = CacheConfig::<String, Vec<u8>>::builder()
///     .maximum_weight(1024)
///     .weigher(|_key, value| value.len() as u64)
///     .expire_after_write(Duration::from_secs(30))
///     .eviction_policy(EvictionPolicy::Weight)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.maximum_weight(), Some(1024));
/// assert_eq!(config.expire_after_write(), Some(Duration::from_secs(30)));
/// assert!(config.record_stats());
/// ```
pub struct CacheConfig<K, V> {
    maximum_size: Option<u64>,
    maximum_weight: Option<u64>,
    weigher: Option<Weigher<K, V>>,
    expire_after_write: Option<Duration>,
    expire_after_access: Option<Duration>,
    refresh_after_write: Option<Duration>,
    eviction_policy: EvictionPolicy,
    loader: Option<Loader<K, V>>,
    async_loader: Option<AsyncLoader<K, V>>,
    record_stats: bool,
    initial_capacity: usize,
    concurrency_level: usize,
    sweep_interval: Duration,
    executor: Option<Handle>,
    listeners: Vec<SharedListener<K, V>>,
}

impl<K, V> CacheConfig<K, V> {
    /// Starts a builder with every option at its default.
    pub fn builder() -> CacheConfigBuilder<K, V> {
        CacheConfigBuilder::new()
    }

    /// Maximum number of entries, if bounded.
    pub fn maximum_size(&self) -> Option<u64> {
        self.maximum_size
    }

    /// Maximum total weight, if bounded.
    pub fn maximum_weight(&self) -> Option<u64> {
        self.maximum_weight
    }

    pub fn weigher(&self) -> Option<&Weigher<K, V>> {
        self.weigher.as_ref()
    }

    pub fn expire_after_write(&self) -> Option<Duration> {
        self.expire_after_write
    }

    pub fn expire_after_access(&self) -> Option<Duration> {
        self.expire_after_access
    }

    pub fn refresh_after_write(&self) -> Option<Duration> {
        self.refresh_after_write
    }

    pub fn eviction_policy(&self) -> &EvictionPolicy {
        &self.eviction_policy
    }

    pub fn loader(&self) -> Option<&Loader<K, V>> {
        self.loader.as_ref()
    }

    pub fn async_loader(&self) -> Option<&AsyncLoader<K, V>> {
        self.async_loader.as_ref()
    }

    /// Whether hit/miss/eviction/load counters are recorded.
    pub fn record_stats(&self) -> bool {
        self.record_stats
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn concurrency_level(&self) -> usize {
        self.concurrency_level
    }

    /// Period of the background refresh/expiry sweep.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// The runtime async operations and refreshes are submitted to, if one was supplied.
    pub fn executor(&self) -> Option<&Handle> {
        self.executor.as_ref()
    }

    pub fn listeners(&self) -> &[SharedListener<K, V>] {
        &self.listeners
    }

    /// Shard count for the entry store: the concurrency level rounded up to a
    /// power of two, at least 2.
    pub(crate) fn shard_amount(&self) -> usize {
        self.concurrency_level.max(2).next_power_of_two()
    }
}

impl<K, V> Clone for CacheConfig<K, V> {
    fn clone(&self) -> Self {
        Self {
            maximum_size: self.maximum_size,
            maximum_weight: self.maximum_weight,
            weigher: self.weigher.clone(),
            expire_after_write: self.expire_after_write,
            expire_after_access: self.expire_after_access,
            refresh_after_write: self.refresh_after_write,
            eviction_policy: self.eviction_policy.clone(),
            loader: self.loader.clone(),
            async_loader: self.async_loader.clone(),
            record_stats: self.record_stats,
            initial_capacity: self.initial_capacity,
            concurrency_level: self.concurrency_level,
            sweep_interval: self.sweep_interval,
            executor: self.executor.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<K, V> fmt::Debug for CacheConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("maximum_size", &self.maximum_size)
            .field("maximum_weight", &self.maximum_weight)
            .field("weigher", &self.weigher.is_some())
            .field("expire_after_write", &self.expire_after_write)
            .field("expire_after_access", &self.expire_after_access)
            .field("refresh_after_write", &self.refresh_after_write)
            .field("eviction_policy", &self.eviction_policy)
            .field("loader", &self.loader.is_some())
            .field("async_loader", &self.async_loader.is_some())
            .field("record_stats", &self.record_stats)
            .field("initial_capacity", &self.initial_capacity)
            .field("concurrency_level", &self.concurrency_level)
            .field("sweep_interval", &self.sweep_interval)
            .field("executor", &self.executor.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Builder for [`CacheConfig`].
///
/// Setters can be called in any order and repeated; the last call wins,
/// except for [`add_listener`](Self::add_listener) and
/// [`listeners`](Self::listeners), which accumulate.
pub struct CacheConfigBuilder<K, V> {
    config: CacheConfig<K, V>,
}

impl<K, V> CacheConfigBuilder<K, V> {
    fn new() -> Self {
        Self {
            config: CacheConfig {
                maximum_size: None,
                maximum_weight: None,
                weigher: None,
                expire_after_write: None,
                expire_after_access: None,
                refresh_after_write: None,
                eviction_policy: EvictionPolicy::default(),
                loader: None,
                async_loader: None,
                record_stats: true,
                initial_capacity: DEFAULT_INITIAL_CAPACITY,
                concurrency_level: DEFAULT_CONCURRENCY_LEVEL,
                sweep_interval: DEFAULT_SWEEP_INTERVAL,
                executor: None,
                listeners: Vec::new(),
            },
        }
    }

    /// Bounds the number of entries. Must be greater than 0.
    pub fn maximum_size(mut self, maximum_size: u64) -> Self {
        self.config.maximum_size = Some(maximum_size);
        self
    }

    /// Bounds the total weight of the entries. Must be greater than 0.
    pub fn maximum_weight(mut self, maximum_weight: u64) -> Self {
        self.config.maximum_weight = Some(maximum_weight);
        self
    }

    /// Sets the function computing an entry's weight from its key and value.
    pub fn weigher<F>(mut self, weigher: F) -> Self
    where
        F: Fn(&K, &V) -> u64 + Send + Sync + 'static,
    {
        self.config.weigher = Some(Arc::new(weigher));
        self
    }

    /// Sets an already shared weigher, such as [`memory_weigher`](crate::memory_weigher).
    pub fn shared_weigher(mut self, weigher: Weigher<K, V>) -> Self {
        self.config.weigher = Some(weigher);
        self
    }

    /// Expires entries a fixed time after they were written.
    ///
    /// Takes priority over [`expire_after_access`](Self::expire_after_access).
    pub fn expire_after_write(mut self, ttl: Duration) -> Self {
        self.config.expire_after_write = Some(ttl);
        self
    }

    /// Expires entries a fixed time after they were last written or read.
    pub fn expire_after_access(mut self, ttl: Duration) -> Self {
        self.config.expire_after_access = Some(ttl);
        self
    }

    /// Reloads entries in the background once they are older than `age`.
    ///
    /// Starts the sweeper, which also removes expired entries.
    pub fn refresh_after_write(mut self, age: Duration) -> Self {
        self.config.refresh_after_write = Some(age);
        self
    }

    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction_policy = policy;
        self
    }

    /// Sets the loader invoked on a miss.
    pub fn loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&K) -> std::result::Result<Option<V>, BoxError> + Send + Sync + 'static,
    {
        self.config.loader = Some(Arc::new(loader));
        self
    }

    /// Sets the asynchronous loader invoked on a miss.
    ///
    /// The future must not borrow the key; clone what it needs.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratocache_core::{BoxError, Cache, CacheConfig};
    ///
    /// let config = CacheConfig::<u64, String>::builder()
    ///     .async_loader(|id: &u64| {
    ///         let id = *id;
    ///         async move { Ok::<_, BoxError>(Some(format!("user-{id}"))) }
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// let cache = Cache::new(config);
    /// assert_eq!(cache.get(&7), Some("user-7".to_string()));
    /// ```
    pub fn async_loader<F, Fut>(mut self, loader: F) -> Self
    where
        K: 'static,
        V: 'static,
        F: Fn(&K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Option<V>, BoxError>> + Send + 'static,
    {
        self.config.async_loader = Some(Arc::new(move |key: &K| loader(key).boxed()));
        self
    }

    pub fn record_stats(mut self, record_stats: bool) -> Self {
        self.config.record_stats = record_stats;
        self
    }

    /// Pre-sizes the entry store.
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.config.initial_capacity = initial_capacity;
        self
    }

    /// Expected number of concurrently writing threads; sizes the store's shards.
    pub fn concurrency_level(mut self, concurrency_level: usize) -> Self {
        self.config.concurrency_level = concurrency_level;
        self
    }

    /// Sets the period of the background sweep. Must be greater than 0.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Submits async operations and background refreshes to `handle` instead
    /// of the shared default runtime.
    pub fn executor(mut self, handle: Handle) -> Self {
        self.config.executor = Some(handle);
        self
    }

    pub fn add_listener(mut self, listener: SharedListener<K, V>) -> Self {
        self.config.listeners.push(listener);
        self
    }

    pub fn listeners(mut self, listeners: impl IntoIterator<Item = SharedListener<K, V>>) -> Self {
        self.config.listeners.extend(listeners);
        self
    }

    /// Validates the options and returns the configuration.
    ///
    /// # Errors
    ///
    /// * [`CacheError::InvalidMaximumSize`] if `maximum_size` is 0
    /// * [`CacheError::InvalidMaximumWeight`] if `maximum_weight` is 0
    /// * [`CacheError::InvalidSweepInterval`] if `sweep_interval` is 0
    pub fn build(self) -> Result<CacheConfig<K, V>> {
        let config = self.config;
        if config.maximum_size == Some(0) {
            return Err(CacheError::InvalidMaximumSize);
        }
        if config.maximum_weight == Some(0) {
            return Err(CacheError::InvalidMaximumWeight);
        }
        if config.sweep_interval.is_zero() {
            return Err(CacheError::InvalidSweepInterval);
        }
        Ok(config)
    }
}

impl<K, V> Default for CacheConfigBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
