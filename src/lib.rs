//! # Stratocache
//!
//! An embeddable, thread-safe, in-process key/value cache with pluggable
//! eviction strategies.
//!
//! ## Features
//!
//! - **Eviction policies**: LRU, MRU, LFU, FIFO, FILO, idle-time, heaviest-first
//!   and composite chains
//! - **Bounds**: Maximum entry count and/or maximum total weight
//! - **Expiration**: Expire after write or after access, with a background
//!   refresh of stale entries
//! - **Loaders**: Synchronous or asynchronous loading on a miss; loader
//!   failures never reach the caller
//! - **Listeners**: Notification of puts, removals, evictions, expirations,
//!   loads and clears
//! - **Statistics**: Hit, miss, eviction and load counters with derived rates
//! - **Async operations**: `get_async`, `put_async`, `remove_async` and
//!   `clear_async` on a tokio runtime
//!
//! ## Quick Start
//!
//! ```rust
//! use stratocache::prelude::*;
//!
//! let cache = Cache::new(
//!     CacheConfig::builder()
//!         .maximum_size(2)
//!         .eviction_policy(EvictionPolicy::LRU)
//!         .build()
//!         .unwrap(),
//! );
//!
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.put("c", 3);
//!
//! assert_eq!(cache.size(), 2);
//! assert!(!cache.contains_key(&"a"));
//! ```
//!
//! ## Weight Bounds
//!
//! A weigher turns each entry into a cost; the cache evicts until the total
//! cost fits under `maximum_weight`:
//!
//! ```rust
//! use stratocache::prelude::*;
//!
//! let cache = Cache::new(
//!     CacheConfig::builder()
//!         .maximum_weight(5)
//!         .weigher(|_key: &&str, value: &String| value.len() as u64)
//!         .build()
//!         .unwrap(),
//! );
//!
//! cache.put("k1", "value1".to_string());
//! cache.put("k2", "val".to_string());
//! cache.put("k3", "v".to_string());
//!
//! assert_eq!(cache.size(), 2);
//! assert!(cache.weighted_size() <= 5);
//! ```
//!
//! ## Loaders
//!
//! A loader fills misses. A failing loader is counted and reported to
//! listeners, and `get` returns `None`:
//!
//! ```rust
//! use stratocache::prelude::*;
//!
//! let cache = Cache::new(
//!     CacheConfig::builder()
//!         .loader(|key: &u32| -> Result<Option<u64>, BoxError> {
//!             if *key == 0 {
//!                 Err("zero is not loadable".into())
//!             } else {
//!                 Ok(Some(u64::from(*key) * 10))
//!             }
//!         })
//!         .build()
//!         .unwrap(),
//! );
//!
//! assert_eq!(cache.get(&4), Some(40));
//! assert_eq!(cache.get(&0), None);
//! assert_eq!(cache.stats().load_failures(), 1);
//! ```

pub use stratocache_core::*;

/// The types needed to build and use a cache.
pub mod prelude {
    pub use stratocache_core::{
        BoxError, Cache, CacheConfig, CacheEventListener, CacheStats, EvictionPolicy,
        EvictionReason, SharedListener,
    };
}
