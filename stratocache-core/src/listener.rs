//! # Cache Events
//!
//! Observers notified synchronously by the cache as entries come and go.
//!
//! A listener implements [`CacheEventListener`] and overrides only the events
//! it cares about; every method has an empty default body. Listeners run on the
//! thread performing the triggering operation, after the mutation is applied,
//! so they must be quick and must not panic: a panic unwinds into the caller
//! and skips the remaining listeners.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use stratocache_core::{Cache, CacheConfig, CacheEventListener, EvictionReason};
//!
//! #[derive(Default)]
//! struct EvictionCounter(AtomicUsize);
//!
//! impl CacheEventListener<String, u32> for EvictionCounter {
//!     fn on_evict(&self, _key: &String, _value: &u32, reason: EvictionReason) {
//!         assert_eq!(reason, EvictionReason::Size);
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let counter = Arc::new(EvictionCounter::default());
//! let config = CacheConfig::<String, u32>::builder()
//!     .maximum_size(1)
//!     .add_listener(counter.clone())
//!     .build()
//!     .unwrap();
//! let cache = Cache::new(config);
//!
//! cache.put("a".to_string(), 1);
//! cache.put("b".to_string(), 2);
//! assert_eq!(counter.0.load(Ordering::Relaxed), 1);
//! ```

use parking_lot::RwLock;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// The maximum entry count was exceeded.
    Size,
    /// The maximum total weight was exceeded.
    Weight,
    /// The entry's expiration instant passed.
    Expired,
    /// The entry was removed by the caller.
    Explicit,
    /// The whole cache was cleared.
    Cleared,
    Unknown,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionReason::Size => "size",
            EvictionReason::Weight => "weight",
            EvictionReason::Expired => "expired",
            EvictionReason::Explicit => "explicit",
            EvictionReason::Cleared => "cleared",
            EvictionReason::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Receives cache events.
///
/// | Event           | Emitted when                                                |
/// |-----------------|-------------------------------------------------------------|
/// | `on_put`        | a value was stored by `put` or by a successful load          |
/// | `on_remove`     | `remove` took a value out, or `put` displaced an old value   |
/// | `on_evict`      | a bound was exceeded and the strategy's candidate was dropped |
/// | `on_expire`     | an expired entry was found by `get` or by the sweeper        |
/// | `on_load`       | a loader produced a value                                    |
/// | `on_load_error` | a loader failed                                              |
/// | `on_clear`      | `clear` ran (once, no per-entry events)                      |
#[allow(unused_variables)]
pub trait CacheEventListener<K, V>: Send + Sync {
    fn on_put(&self, key: &K, value: &V) {}

    fn on_remove(&self, key: &K, value: &V) {}

    fn on_evict(&self, key: &K, value: &V, reason: EvictionReason) {}

    fn on_expire(&self, key: &K, value: &V) {}

    fn on_load(&self, key: &K, value: &V) {}

    fn on_load_error(&self, key: &K, error: &(dyn Error + Send + Sync + 'static)) {}

    fn on_clear(&self) {}
}

/// A listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpListener;

impl<K, V> CacheEventListener<K, V> for NoOpListener {}

/// Handle returned when a listener is registered at runtime, used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Shared listener handle.
pub type SharedListener<K, V> = Arc<dyn CacheEventListener<K, V>>;

/// The set of listeners attached to one cache.
///
/// Registration takes a write lock; dispatch clones the current set under a
/// read lock and notifies outside of it, so listeners may register or remove
/// other listeners without deadlocking.
pub(crate) struct ListenerRegistry<K, V> {
    listeners: RwLock<Vec<(ListenerId, SharedListener<K, V>)>>,
    next_id: AtomicU64,
}

impl<K, V> ListenerRegistry<K, V> {
    pub(crate) fn new(initial: impl IntoIterator<Item = SharedListener<K, V>>) -> Self {
        let registry = Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        };
        for listener in initial {
            registry.add(listener);
        }
        registry
    }

    pub(crate) fn add(&self, listener: SharedListener<K, V>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }

    fn snapshot(&self) -> Vec<SharedListener<K, V>> {
        self.listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn each(&self, mut notify: impl FnMut(&dyn CacheEventListener<K, V>)) {
        // skip the allocation on the hot path when nobody listens
        if self.listeners.read().is_empty() {
            return;
        }
        for listener in self.snapshot() {
            notify(listener.as_ref());
        }
    }

    pub(crate) fn put(&self, key: &K, value: &V) {
        self.each(|l| l.on_put(key, value));
    }

    pub(crate) fn remove_event(&self, key: &K, value: &V) {
        self.each(|l| l.on_remove(key, value));
    }

    pub(crate) fn evict(&self, key: &K, value: &V, reason: EvictionReason) {
        self.each(|l| l.on_evict(key, value, reason));
    }

    pub(crate) fn expire(&self, key: &K, value: &V) {
        self.each(|l| l.on_expire(key, value));
    }

    pub(crate) fn load(&self, key: &K, value: &V) {
        self.each(|l| l.on_load(key, value));
    }

    pub(crate) fn load_error(&self, key: &K, error: &(dyn Error + Send + Sync + 'static)) {
        self.each(|l| l.on_load_error(key, error));
    }

    pub(crate) fn clear(&self) {
        self.each(|l| l.on_clear());
    }
}
