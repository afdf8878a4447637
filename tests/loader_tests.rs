use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stratocache::prelude::*;

/// Test a loader fills a miss and the value is cached afterwards
#[test]
fn test_loader_populates_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let cache = Cache::new(
        CacheConfig::<u32, String>::builder()
            .loader(move |id: &u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(format!("user-{id}")))
            })
            .build()
            .unwrap(),
    );

    assert_eq!(cache.get(&1), Some("user-1".to_string()));
    assert_eq!(cache.get(&1), Some("user-1".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let stats = cache.stats();
    assert_eq!(stats.misses(), 1);
    assert_eq!(stats.hits(), 1);
    assert_eq!(stats.loads(), 1);
    assert!(cache.contains_key(&1));
}

/// Test a loader returning nothing stores nothing
#[test]
fn test_loader_without_value() {
    let cache = Cache::new(
        CacheConfig::<u32, String>::builder()
            .loader(|_: &u32| Ok(None))
            .build()
            .unwrap(),
    );

    assert_eq!(cache.get(&1), None);
    assert!(cache.is_empty());
    assert_eq!(cache.stats().loads(), 0);
    assert_eq!(cache.stats().load_failures(), 0);
}

/// Test put never consults the loader
#[test]
fn test_put_does_not_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let cache = Cache::new(
        CacheConfig::<u32, u32>::builder()
            .loader(move |k: &u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(*k))
            })
            .build()
            .unwrap(),
    );

    cache.put(1, 100);
    assert_eq!(cache.get(&1), Some(100));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Test a failing loader is contained inside get
#[test]
fn test_loader_failure_is_contained() {
    let cache = Cache::new(
        CacheConfig::<u32, u32>::builder()
            .loader(|_: &u32| Err("database offline".into()))
            .build()
            .unwrap(),
    );

    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&1), None);

    let stats = cache.stats();
    assert_eq!(stats.load_failures(), 2);
    assert_eq!(stats.loads(), 0);
    assert_eq!(stats.misses(), 2);
    assert!(cache.is_empty());
}

/// Test the loaded entry goes through the normal bounding path
#[test]
fn test_loaded_values_respect_size_bound() {
    let cache = Cache::new(
        CacheConfig::<u32, u32>::builder()
            .maximum_size(2)
            .eviction_policy(EvictionPolicy::FIFO)
            .loader(|k: &u32| Ok(Some(k * 2)))
            .build()
            .unwrap(),
    );

    for k in 0..5 {
        assert_eq!(cache.get(&k), Some(k * 2));
    }

    assert_eq!(cache.size(), 2);
    assert_eq!(cache.stats().evictions(), 3);
    assert!(cache.contains_key(&3));
    assert!(cache.contains_key(&4));
}

/// Test load latency is accumulated
#[test]
fn test_load_time_is_recorded() {
    let cache = Cache::new(
        CacheConfig::<u32, u32>::builder()
            .loader(|k: &u32| {
                std::thread::sleep(Duration::from_millis(10));
                Ok(Some(*k))
            })
            .build()
            .unwrap(),
    );

    cache.get(&1);
    cache.get(&2);

    let stats = cache.stats();
    assert_eq!(stats.loads(), 2);
    assert!(stats.total_load_time() >= Duration::from_millis(20));
    assert_eq!(
        stats.average_load_time(),
        stats.total_load_time_nanos() as f64 / 2.0
    );
}

/// Test an async loader can await tokio timers
#[test]
fn test_async_loader() {
    let cache = Cache::new(
        CacheConfig::<u32, String>::builder()
            .async_loader(|id: &u32| {
                let id = *id;
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok::<_, BoxError>(Some(format!("async-{id}")))
                }
            })
            .build()
            .unwrap(),
    );

    assert_eq!(cache.get(&3), Some("async-3".to_string()));
    assert_eq!(cache.stats().loads(), 1);
    assert_eq!(cache.size(), 1);
}

/// Test the async loader wins when both loaders are configured
#[test]
fn test_async_loader_has_priority() {
    let cache = Cache::new(
        CacheConfig::<u32, &'static str>::builder()
            .loader(|_: &u32| Ok(Some("sync")))
            .async_loader(|_: &u32| async { Ok::<_, BoxError>(Some("async")) })
            .build()
            .unwrap(),
    );

    assert_eq!(cache.get(&1), Some("async"));
}

/// Test an async loader failure is contained like a sync one
#[test]
fn test_async_loader_failure() {
    let cache = Cache::new(
        CacheConfig::<u32, u32>::builder()
            .async_loader(|_: &u32| async { Err::<Option<u32>, BoxError>("timeout".into()) })
            .build()
            .unwrap(),
    );

    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.stats().load_failures(), 1);
}

/// Test get_or_insert_with computes only when nothing is cached or loadable
#[test]
fn test_get_or_insert_with() {
    let cache: Cache<&str, u32> = Cache::new(CacheConfig::builder().build().unwrap());

    assert_eq!(cache.get_or_insert_with("a", || 1), 1);
    assert_eq!(cache.get_or_insert_with("a", || 2), 1);
    assert_eq!(cache.get_or_default(&"b", 9), 9);
    assert!(!cache.contains_key(&"b"));
}

fn sleeping_loader_cache(executor: tokio::runtime::Handle) -> Cache<u32, u32> {
    Cache::new(
        CacheConfig::<u32, u32>::builder()
            .executor(executor)
            .async_loader(|k: &u32| {
                let k = *k;
                async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok::<_, BoxError>(Some(k * 10))
                }
            })
            .build()
            .unwrap(),
    )
}

/// Test an async loader completes when the executor is a current-thread
/// runtime that nobody is driving
#[test]
fn test_async_loader_with_idle_current_thread_executor() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let cache = sleeping_loader_cache(runtime.handle().clone());

    let (tx, rx) = std::sync::mpsc::channel();
    let reader = cache.clone();
    std::thread::spawn(move || {
        let _ = tx.send(reader.get(&1));
    });

    let loaded = rx.recv_timeout(Duration::from_secs(3));
    assert_eq!(loaded, Ok(Some(10)));
    assert_eq!(cache.stats().loads(), 1);
}

/// Test an async loader completes when get runs on the current-thread
/// runtime's own thread
#[test]
fn test_async_loader_inside_current_thread_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let cache = sleeping_loader_cache(runtime.handle().clone());

    let loaded = runtime.block_on(async { cache.get(&2) });

    assert_eq!(loaded, Some(20));
}
