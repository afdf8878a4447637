//! # Stratocache Core
//!
//! The cache engine behind `stratocache`: a concurrent in-process key/value
//! store with pluggable eviction strategies.
//!
//! ## Features
//!
//! - **Eviction Strategies**: LRU, MRU, LFU, FIFO, FILO, idle-time, heaviest-first
//!   and composite chains of those
//! - **Bounds**: Maximum entry count and maximum total weight (with a custom weigher)
//! - **Expiration**: Expire after write or after access
//! - **Loaders**: Synchronous or asynchronous value loading on a miss
//! - **Refresh**: Background reload of entries older than a configured age
//! - **Listeners**: Synchronous notification of puts, removals, evictions,
//!   expirations, loads and clears
//! - **Statistics**: Atomic hit/miss/eviction/load counters
//!
//! ## Module Organization
//!
//! - [`cache`] - The cache engine and its read-only entry view
//! - [`config`] - Validated configuration and its builder
//! - [`eviction_strategy`] - Stateful strategies and their per-key metadata
//! - [`listener`] - Event listener capability and eviction reasons
//! - [`serializer`] - Persistence capability (formats declared, not implemented)
//! - [`utils`] - Candidate scan helpers shared by the strategies
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use stratocache_core::{Cache, CacheConfig, EvictionPolicy};
//!
//! let cache = Cache::new(
//!     CacheConfig::builder()
//!         .maximum_size(100)
//!         .expire_after_write(Duration::from_secs(60))
//!         .eviction_policy(EvictionPolicy::LFU)
//!         .build()
//!         .unwrap(),
//! );
//!
//! cache.put("answer".to_string(), 42);
//! assert_eq!(cache.get(&"answer".to_string()), Some(42));
//! assert_eq!(cache.stats().hit_rate(), 1.0);
//! ```

mod cache_entry;
mod error;
mod eviction_policy;
mod executor;
mod loader;
mod stats;
mod sweeper;
mod weigher;

pub mod cache;
pub mod config;
pub mod eviction_strategy;
pub mod listener;
pub mod serializer;
pub mod utils;

pub use cache::{Cache, CacheEntryView};
pub use cache_entry::CacheEntry;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use error::{BoxError, CacheError, Result};
pub use eviction_policy::EvictionPolicy;
pub use eviction_strategy::{EntryStore, EvictionStrategy};
pub use executor::default_handle;
pub use listener::{CacheEventListener, EvictionReason, ListenerId, NoOpListener, SharedListener};
pub use loader::{AsyncLoader, Loader};
pub use serializer::{BinarySerializer, CacheSerializer, JsonSerializer, ProtobufSerializer};
pub use stats::CacheStats;
pub use weigher::{memory_weigher, unit_weigher, MemoryEstimator, Weigher};
