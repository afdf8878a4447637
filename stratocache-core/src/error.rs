use thiserror::Error;

/// Boxed error type returned by loaders.
///
/// Loader failures never escape [`Cache::get`](crate::Cache::get); they are
/// counted as load failures and handed to
/// [`CacheEventListener::on_load_error`](crate::CacheEventListener::on_load_error).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by cache construction and by unsupported operations.
///
/// # Examples
///
/// ```
/// use stratocache_core::{CacheConfig, CacheError};
///
/// let err = CacheConfig::<String, String>::builder()
///     .maximum_size(0)
///     .build()
///     .unwrap_err();
/// assert!(matches!(err, CacheError::InvalidMaximumSize));
/// ```
#[derive(Debug, Error)]
pub enum CacheError {
    /// A maximum entry count of zero was configured.
    #[error("maximum size must be greater than 0")]
    InvalidMaximumSize,

    /// A maximum total weight of zero was configured.
    #[error("maximum weight must be greater than 0")]
    InvalidMaximumWeight,

    /// A zero sweep interval was configured.
    #[error("sweep interval must be greater than 0")]
    InvalidSweepInterval,

    /// The requested operation is not supported by this component.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// I/O failure while reading or writing serialized entries.
    ///
    /// The built-in serializers never produce it; it lets a
    /// [`CacheSerializer`](crate::CacheSerializer) implementation use `?` on
    /// its reader and writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;
