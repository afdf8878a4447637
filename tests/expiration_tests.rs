use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use stratocache::prelude::*;

#[derive(Default)]
struct ExpiryCounter {
    expired: AtomicUsize,
    removed: AtomicUsize,
}

impl CacheEventListener<&'static str, i32> for ExpiryCounter {
    fn on_expire(&self, _key: &&'static str, _value: &i32) {
        self.expired.fetch_add(1, Ordering::SeqCst);
    }

    fn on_remove(&self, _key: &&'static str, _value: &i32) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Test entries expire a fixed time after write
#[test]
#[serial]
fn test_expire_after_write() {
    let cache = Cache::new(
        CacheConfig::builder()
            .expire_after_write(Duration::from_millis(100))
            .build()
            .unwrap(),
    );

    cache.put("key", 1);
    assert_eq!(cache.get(&"key"), Some(1));

    thread::sleep(Duration::from_millis(200));

    let misses_before = cache.stats().misses();
    assert_eq!(cache.get(&"key"), None);
    assert_eq!(cache.stats().misses(), misses_before + 1);
    assert_eq!(cache.size(), 0);
}

/// Test expired entries are hidden from the read-only views before removal
#[test]
#[serial]
fn test_expired_entries_are_not_visible() {
    let cache = Cache::new(
        CacheConfig::builder()
            .expire_after_write(Duration::from_millis(50))
            .build()
            .unwrap(),
    );

    cache.put("old", 1);
    thread::sleep(Duration::from_millis(100));
    cache.put("new", 2);

    assert!(!cache.contains_key(&"old"));
    assert!(cache.contains_key(&"new"));
    assert_eq!(cache.keys(), vec!["new"]);
    assert_eq!(cache.values(), vec![2]);
    assert_eq!(cache.entries().len(), 1);

    // not yet removed
    assert_eq!(cache.size(), 2);
    assert!(!cache.is_empty());

    // lookups through the views are not reads
    let stats = cache.stats();
    assert_eq!((stats.hits(), stats.misses()), (0, 0));

    // the next get finds the expiry and removes the entry
    assert_eq!(cache.get(&"old"), None);
    assert_eq!(cache.size(), 1);
}

/// Test a read keeps an entry alive under expire-after-access
#[test]
#[serial]
fn test_expire_after_access_is_extended_by_reads() {
    let cache = Cache::new(
        CacheConfig::builder()
            .expire_after_access(Duration::from_millis(150))
            .build()
            .unwrap(),
    );

    cache.put("key", 1);
    for _ in 0..4 {
        thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get(&"key"), Some(1));
    }

    thread::sleep(Duration::from_millis(250));
    assert_eq!(cache.get(&"key"), None);
}

/// Test expire-after-write wins when both durations are configured
#[test]
#[serial]
fn test_write_expiry_has_priority() {
    let cache = Cache::new(
        CacheConfig::builder()
            .expire_after_write(Duration::from_millis(100))
            .expire_after_access(Duration::from_secs(60))
            .build()
            .unwrap(),
    );

    cache.put("key", 1);
    thread::sleep(Duration::from_millis(60));
    assert_eq!(cache.get(&"key"), Some(1));
    thread::sleep(Duration::from_millis(80));
    assert_eq!(cache.get(&"key"), None);
}

/// Test an expired read emits on_expire only, once
#[test]
#[serial]
fn test_expiry_notifies_on_expire_once() {
    let counter = Arc::new(ExpiryCounter::default());
    let cache = Cache::new(
        CacheConfig::<&'static str, i32>::builder()
            .expire_after_write(Duration::from_millis(50))
            .add_listener(counter.clone())
            .build()
            .unwrap(),
    );

    cache.put("key", 1);
    thread::sleep(Duration::from_millis(100));

    assert_eq!(cache.get(&"key"), None);
    assert_eq!(cache.get(&"key"), None);

    assert_eq!(counter.expired.load(Ordering::SeqCst), 1);
    assert_eq!(counter.removed.load(Ordering::SeqCst), 0);
}

/// Test a re-put after expiry stores a fresh entry
#[test]
#[serial]
fn test_put_after_expiry_restarts_ttl() {
    let cache = Cache::new(
        CacheConfig::builder()
            .expire_after_write(Duration::from_millis(80))
            .build()
            .unwrap(),
    );

    cache.put("key", 1);
    thread::sleep(Duration::from_millis(120));
    cache.put("key", 2);

    assert_eq!(cache.get(&"key"), Some(2));
}

/// Test an expired entry is not revived by the loader during the same get
#[test]
#[serial]
fn test_expired_get_does_not_load() {
    let cache = Cache::new(
        CacheConfig::<&'static str, i32>::builder()
            .expire_after_write(Duration::from_millis(50))
            .loader(|_: &&str| -> Result<Option<i32>, BoxError> { Ok(Some(99)) })
            .build()
            .unwrap(),
    );

    cache.put("key", 1);
    thread::sleep(Duration::from_millis(100));

    assert_eq!(cache.get(&"key"), None);
    assert_eq!(cache.stats().loads(), 0);

    // the next miss finds nothing stored and loads
    assert_eq!(cache.get(&"key"), Some(99));
    assert_eq!(cache.stats().loads(), 1);
}
