use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Cache statistics for monitoring hit/miss rates, evictions and loads.
///
/// Six independent counters are tracked with atomic operations, so recording
/// from many threads at once never loses an increment. The counters are not
/// updated as a group: a reader may observe a hit without the access metadata
/// of the same `get` being visible yet.
///
/// # Thread Safety
///
/// All operations use `Relaxed` ordering. Each counter is individually
/// consistent; derived rates are computed from two separate loads.
///
/// # Examples
///
/// ```
/// use stratocache_core::CacheStats;
/// use std::time::Duration;
///
/// let stats = CacheStats::new();
///
/// stats.record_hit();
/// stats.record_hit();
/// stats.record_miss();
/// stats.record_load(Duration::from_nanos(300));
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert!((stats.hit_rate() - 0.6666).abs() < 0.001);
/// assert_eq!(stats.average_load_time(), 300.0);
/// ```
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    total_load_time: AtomicU64,
}

impl CacheStats {
    /// Creates a new `CacheStats` instance with zero counters.
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
            total_load_time: AtomicU64::new(0),
        }
    }

    /// Records a cache hit (successful lookup of a live entry).
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cache miss (absent or expired entry).
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one evicted entry.
    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful load and the time it took.
    ///
    /// Load time is accumulated in nanoseconds, saturating at `u64::MAX`.
    #[inline]
    pub fn record_load(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.total_load_time.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Records a loader failure.
    #[inline]
    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of cache hits.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the total number of cache misses.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Returns the total number of evicted entries.
    #[inline]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Returns the number of successful loads.
    #[inline]
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Returns the number of failed loads.
    #[inline]
    pub fn load_failures(&self) -> u64 {
        self.load_failures.load(Ordering::Relaxed)
    }

    /// Returns the accumulated load time in nanoseconds.
    #[inline]
    pub fn total_load_time_nanos(&self) -> u64 {
        self.total_load_time.load(Ordering::Relaxed)
    }

    /// Returns the accumulated load time.
    pub fn total_load_time(&self) -> Duration {
        Duration::from_nanos(self.total_load_time_nanos())
    }

    /// Returns the total number of lookups (hits + misses).
    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Returns hits / (hits + misses), or 0.0 when there were no lookups.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratocache_core::CacheStats;
    ///
    /// let stats = CacheStats::new();
    /// assert_eq!(stats.hit_rate(), 0.0);
    ///
    /// stats.record_hit();
    /// stats.record_miss();
    /// assert_eq!(stats.hit_rate(), 0.5);
    /// ```
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Returns misses / (hits + misses), or 0.0 when there were no lookups.
    pub fn miss_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.misses() as f64 / total as f64
        }
    }

    /// Returns the mean load time in nanoseconds, or 0.0 when nothing was loaded.
    pub fn average_load_time(&self) -> f64 {
        let loads = self.loads();
        if loads == 0 {
            0.0
        } else {
            self.total_load_time_nanos() as f64 / loads as f64
        }
    }

    /// Returns an independent, frozen copy of the counters.
    ///
    /// Later activity on `self` (including [`reset`](Self::reset)) does not
    /// affect the snapshot.
    pub fn snapshot(&self) -> Self {
        Self {
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
            evictions: AtomicU64::new(self.evictions()),
            loads: AtomicU64::new(self.loads()),
            load_failures: AtomicU64::new(self.load_failures()),
            total_load_time: AtomicU64::new(self.total_load_time_nanos()),
        }
    }

    /// Resets all counters to zero in place.
    ///
    /// Snapshots taken earlier keep their values.
    ///
    /// # Examples
    ///
    /// ```
    /// use stratocache_core::CacheStats;
    ///
    /// let stats = CacheStats::new();
    /// stats.record_hit();
    /// let before = stats.snapshot();
    ///
    /// stats.reset();
    /// assert_eq!(stats.hits(), 0);
    /// assert_eq!(before.hits(), 1);
    /// ```
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.loads.store(0, Ordering::Relaxed);
        self.load_failures.store(0, Ordering::Relaxed);
        self.total_load_time.store(0, Ordering::Relaxed);
    }

    fn counters(&self) -> [u64; 6] {
        [
            self.hits(),
            self.misses(),
            self.evictions(),
            self.loads(),
            self.load_failures(),
            self.total_load_time_nanos(),
        ]
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        self.snapshot()
    }
}

impl PartialEq for CacheStats {
    fn eq(&self, other: &Self) -> bool {
        self.counters() == other.counters()
    }
}

impl Eq for CacheStats {}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, evictions: {}, loads: {}, load_failures: {}, total_load_time_nanos: {} }}",
            self.hits(),
            self.misses(),
            self.evictions(),
            self.loads(),
            self.load_failures(),
            self.total_load_time_nanos()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.misses(), 0);
        assert_eq!(stats.evictions(), 0);
        assert_eq!(stats.loads(), 0);
        assert_eq!(stats.load_failures(), 0);
        assert_eq!(stats.total_load_time_nanos(), 0);
    }

    #[test]
    fn test_each_counter_increments_by_one() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_eviction();
        stats.record_load(Duration::from_nanos(10));
        stats.record_load_failure();

        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.evictions(), 1);
        assert_eq!(stats.loads(), 1);
        assert_eq!(stats.load_failures(), 1);
        assert_eq!(stats.total_load_time_nanos(), 10);
    }

    #[test]
    fn test_rates_without_accesses() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 0.0);
        assert_eq!(stats.average_load_time(), 0.0);
    }

    #[test]
    fn test_rates_sum_to_one() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        assert!((stats.hit_rate() + stats.miss_rate() - 1.0).abs() < f64::EPSILON);
        assert!((stats.miss_rate() - 0.6666).abs() < 0.001);
    }

    #[test]
    fn test_average_load_time() {
        let stats = CacheStats::new();
        stats.record_load(Duration::from_nanos(100));
        stats.record_load(Duration::from_nanos(300));
        assert_eq!(stats.average_load_time(), 200.0);
        assert_eq!(stats.total_load_time(), Duration::from_nanos(400));
    }

    #[test]
    fn test_reset_mutates_in_place_and_keeps_snapshots() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_eviction();
        let snapshot = stats.snapshot();

        stats.reset();

        assert_eq!(stats, CacheStats::new());
        assert_eq!(snapshot.hits(), 1);
        assert_eq!(snapshot.evictions(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let stats = CacheStats::new();
        stats.record_hit();

        let snapshot = stats.snapshot();
        stats.record_hit();

        assert_eq!(snapshot.hits(), 1);
        assert_eq!(stats.hits(), 2);
        assert_ne!(snapshot, stats);
    }

    #[test]
    fn test_equality_and_display() {
        let a = CacheStats::new();
        let b = CacheStats::new();
        a.record_miss();
        b.record_miss();
        assert_eq!(a, b);
        assert_eq!(
            a.to_string(),
            "CacheStats { hits: 0, misses: 1, evictions: 0, loads: 0, load_failures: 0, total_load_time_nanos: 0 }"
        );
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(CacheStats::new());
        let mut handles = vec![];

        // 10 threads each record 100 hits and 50 misses
        for _ in 0..10 {
            let stats_clone = Arc::clone(&stats);
            let handle = thread::spawn(move || {
                for _ in 0..100 {
                    stats_clone.record_hit();
                }
                for _ in 0..50 {
                    stats_clone.record_miss();
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.hits(), 1000);
        assert_eq!(stats.misses(), 500);
        assert_eq!(stats.total_accesses(), 1500);
    }
}
