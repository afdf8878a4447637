use crate::{executor, BoxError};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Synchronous value loader invoked on a cache miss.
///
/// Returns `Ok(Some(value))` to populate the cache, `Ok(None)` when the key has
/// no value, or an error. Errors never reach the caller of
/// [`Cache::get`](crate::Cache::get).
pub type Loader<K, V> = Arc<dyn Fn(&K) -> Result<Option<V>, BoxError> + Send + Sync>;

/// Asynchronous value loader invoked on a cache miss.
///
/// The returned future is driven to completion on the thread that called
/// `get`, inside the cache's runtime context, so tokio timers and I/O may be
/// used by the loader. A current-thread runtime only drives its timers and I/O
/// inside its own `block_on`, so for such an executor the future runs in the
/// context of the default runtime instead. Takes priority over a synchronous
/// [`Loader`] when both are configured.
pub type AsyncLoader<K, V> =
    Arc<dyn Fn(&K) -> BoxFuture<'static, Result<Option<V>, BoxError>> + Send + Sync>;

/// The loaders configured for a cache.
pub(crate) struct Loaders<'a, K, V> {
    pub(crate) sync: Option<&'a Loader<K, V>>,
    pub(crate) async_: Option<&'a AsyncLoader<K, V>>,
}

impl<K, V> Loaders<'_, K, V> {
    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_none() && self.async_.is_none()
    }

    /// Invokes the configured loader for `key` and waits for its result.
    ///
    /// Returns `None` when no loader is configured.
    pub(crate) fn load(&self, key: &K, runtime: &Handle) -> Option<Result<Option<V>, BoxError>> {
        if let Some(loader) = self.async_ {
            let future = loader(key);
            let driver = driving_handle(runtime);
            let _guard = driver.enter();
            return Some(futures::executor::block_on(future));
        }
        self.sync.map(|loader| loader(key))
    }
}

/// Returns a runtime whose drivers run on their own worker threads.
fn driving_handle(runtime: &Handle) -> Handle {
    match runtime.runtime_flavor() {
        RuntimeFlavor::CurrentThread => executor::default_handle(),
        _ => runtime.clone(),
    }
}
