use once_cell::sync::Lazy;
use tokio::runtime::{Builder, Handle, Runtime};

/// Process-wide runtime used by caches that were not given an executor.
///
/// Created on first use and never shut down. Async cache operations run on its
/// blocking pool; async loaders run their timers and I/O on its workers.
static DEFAULT_RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    Builder::new_multi_thread()
        .thread_name("stratocache-worker")
        .enable_all()
        .build()
        .expect("failed to create the default stratocache runtime")
});

/// Returns a handle to the shared default runtime.
///
/// # Panics
///
/// Panics on first use if the operating system refuses to create the runtime's
/// worker threads.
pub fn default_handle() -> Handle {
    DEFAULT_RUNTIME.handle().clone()
}

/// Resolves the runtime a cache submits work to.
pub(crate) fn resolve(configured: Option<&Handle>) -> Handle {
    configured.cloned().unwrap_or_else(default_handle)
}
