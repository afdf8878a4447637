use std::time::Duration;

/// Describes which eviction strategy a cache uses when it exceeds its bounds.
///
/// The policy is a plain descriptor stored in [`CacheConfig`](crate::CacheConfig).
/// The cache turns it into a stateful
/// [`EvictionStrategy`](crate::EvictionStrategy) at construction time.
///
/// # Variants
///
/// * `LRU` - **Least Recently Used** (default)
///   - Evicts the key touched longest ago
///   - Every read and write counts as a touch
///
/// * `MRU` - **Most Recently Used**
///   - Evicts the key touched most recently
///   - Useful for cyclic scans larger than the cache
///
/// * `LFU` - **Least Frequently Used**
///   - Evicts the key with the fewest touches
///
/// * `FIFO` - **First In, First Out**
///   - Evicts the key inserted first
///   - Re-putting an existing key does NOT move it
///
/// * `FILO` - **First In, Last Out**
///   - Evicts the key inserted last
///
/// * `IdleTime(threshold)` - **Idle time**
///   - Only keys idle for at least `threshold` are eligible
///   - Evicts the most idle eligible key
///
/// * `Weight` - **Heaviest first**
///   - Evicts the key with the largest weight
///
/// * `Composite(policies)` - **Chain of policies**
///   - Tries each policy in order, the first one with a candidate wins
///
/// # Examples
///
/// ```
/// use stratocache_core::EvictionPolicy;
///
/// let default_policy = EvictionPolicy::default();
/// assert_eq!(default_policy, EvictionPolicy::LRU);
///
/// let policy: EvictionPolicy = "filo".into();
/// assert_eq!(policy, EvictionPolicy::FILO);
/// ```
///
/// # Performance Characteristics
///
/// Every variant keeps a per-key metadata map and scans it on eviction.
///
/// | Policy    | Eviction | Access |
/// |-----------|----------|--------|
/// | LRU / MRU | O(n)     | O(1)   |
/// | LFU       | O(n)     | O(1)   |
/// | FIFO/FILO | O(n)     | O(1)   |
/// | IdleTime  | O(n)     | O(1)   |
/// | Weight    | O(n)     | O(1)   |
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    #[default]
    LRU,
    MRU,
    LFU,
    FIFO,
    FILO,
    IdleTime(Duration),
    Weight,
    Composite(Vec<EvictionPolicy>),
}

impl EvictionPolicy {
    /// Returns a short lowercase name, used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            EvictionPolicy::LRU => "lru",
            EvictionPolicy::MRU => "mru",
            EvictionPolicy::LFU => "lfu",
            EvictionPolicy::FIFO => "fifo",
            EvictionPolicy::FILO => "filo",
            EvictionPolicy::IdleTime(_) => "idle",
            EvictionPolicy::Weight => "weight",
            EvictionPolicy::Composite(_) => "composite",
        }
    }
}

/// Converts a string slice to an `EvictionPolicy`.
///
/// The conversion is case-insensitive and defaults to LRU for unrecognized
/// values. Idle-time and composite policies carry parameters and cannot be
/// parsed from a bare name.
///
/// # Examples
///
/// ```
/// use stratocache_core::EvictionPolicy;
///
/// let lfu: EvictionPolicy = "LFU".into();
/// assert_eq!(lfu, EvictionPolicy::LFU);
///
/// let unknown: EvictionPolicy = "random".into();
/// assert_eq!(unknown, EvictionPolicy::LRU);
/// ```
impl From<&str> for EvictionPolicy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mru" => EvictionPolicy::MRU,
            "lfu" => EvictionPolicy::LFU,
            "fifo" => EvictionPolicy::FIFO,
            "filo" => EvictionPolicy::FILO,
            "weight" => EvictionPolicy::Weight,
            _ => EvictionPolicy::LRU,
        }
    }
}
