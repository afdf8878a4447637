use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A stored value together with its weight, expiration and access metadata.
///
/// The value and weight are fixed once the entry is created; a new `put` for
/// the same key replaces the whole entry. Only the access metadata (access
/// count, last access instant and, for access-based expiry, the expiration
/// instant) changes in place, which is why those fields use atomics and
/// `parking_lot::Mutex` instead of requiring `&mut self`.
///
/// # Type Parameters
///
/// * `V` - The type of the cached value
///
/// # Examples
///
/// ```
/// use stratocache_core::CacheEntry;
/// use std::time::{Duration, Instant};
///
/// let entry = CacheEntry::new("data", 1, Some(Instant::now() + Duration::from_secs(60)));
/// assert_eq!(*entry.value(), "data");
/// assert_eq!(entry.access_count(), 0);
/// assert!(!entry.is_expired());
///
/// entry.record_access();
/// assert_eq!(entry.access_count(), 1);
/// ```
#[derive(Debug)]
pub struct CacheEntry<V> {
    value: V,
    weight: u64,
    created_at: Instant,
    expires_at: Mutex<Option<Instant>>,
    access_count: AtomicU64,
    last_access: Mutex<Instant>,
}

impl<V> CacheEntry<V> {
    /// Creates a new entry stamped with the current instant.
    ///
    /// # Arguments
    ///
    /// * `value` - The value to cache
    /// * `weight` - Cost of the entry for weight-bounded caches
    /// * `expires_at` - Instant after which the entry is expired, `None` for never
    pub fn new(value: V, weight: u64, expires_at: Option<Instant>) -> Self {
        let now = Instant::now();
        Self {
            value,
            weight,
            created_at: now,
            expires_at: Mutex::new(expires_at),
            access_count: AtomicU64::new(0),
            last_access: Mutex::new(now),
        }
    }

    /// Returns a reference to the cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry and returns the cached value.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns the weight computed when the entry was created.
    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Returns the instant the entry was created.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns how long ago the entry was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Returns the current expiration instant, if any.
    pub fn expires_at(&self) -> Option<Instant> {
        *self.expires_at.lock()
    }

    /// Returns `true` if the entry has an expiration instant in the past.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Returns `true` if the entry is expired at the given instant.
    ///
    /// An entry expires strictly after its expiration instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.expires_at(), Some(deadline) if now > deadline)
    }

    /// Returns the number of successful reads of this entry.
    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    /// Returns the instant of the last successful read (creation if never read).
    pub fn last_access(&self) -> Instant {
        *self.last_access.lock()
    }

    /// Records a successful read: bumps the access count and the last access instant.
    pub fn record_access(&self) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        *self.last_access.lock() = Instant::now();
    }

    /// Moves the expiration instant to `now + ttl`.
    ///
    /// Used for access-based expiry. An instant that would overflow clears the
    /// expiration.
    pub(crate) fn extend_expiration(&self, ttl: Duration) {
        *self.expires_at.lock() = Instant::now().checked_add(ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_entry_not_expired() {
        let entry = CacheEntry::new(42, 1, Some(Instant::now() + Duration::from_secs(10)));
        assert_eq!(*entry.value(), 42);
        assert_eq!(entry.weight(), 1);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("data", 1, Some(Instant::now() + Duration::from_millis(50)));
        thread::sleep(Duration::from_millis(100));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_no_expiration_never_expires() {
        let entry = CacheEntry::new(100, 1, None);
        thread::sleep(Duration::from_millis(20));
        assert!(!entry.is_expired());
        assert!(entry.expires_at().is_none());
    }

    #[test]
    fn test_record_access_updates_metadata() {
        let entry = CacheEntry::new(1, 1, None);
        let before = entry.last_access();
        thread::sleep(Duration::from_millis(5));

        entry.record_access();
        entry.record_access();

        assert_eq!(entry.access_count(), 2);
        assert!(entry.last_access() > before);
    }

    #[test]
    fn test_extend_expiration_slides_deadline() {
        let entry = CacheEntry::new(1, 1, Some(Instant::now() + Duration::from_millis(30)));
        thread::sleep(Duration::from_millis(20));
        entry.extend_expiration(Duration::from_millis(200));
        thread::sleep(Duration::from_millis(20));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_into_value() {
        let entry = CacheEntry::new(String::from("owned"), 3, None);
        assert_eq!(entry.into_value(), "owned");
    }
}
