use std::collections::HashMap;
use std::mem::size_of;
use std::sync::Arc;

/// Computes the cost of an entry for weight-bounded caches.
///
/// The weigher is called once when an entry is created (on `put` or after a
/// successful load) and the result is stored with the entry. It receives both
/// the key and the value.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stratocache_core::Weigher;
///
/// let by_length: Weigher<String, String> = Arc::new(|_key: &String, value: &String| value.len() as u64);
/// assert_eq!(by_length(&"k".to_string(), &"value1".to_string()), 6);
/// ```
pub type Weigher<K, V> = Arc<dyn Fn(&K, &V) -> u64 + Send + Sync>;

/// Returns a weigher that charges every entry a weight of 1.
///
/// This is what a cache uses when no weigher is configured.
pub fn unit_weigher<K: 'static, V: 'static>() -> Weigher<K, V> {
    Arc::new(|_: &K, _: &V| 1)
}

/// Returns a weigher that charges an entry the estimated memory of its key and value.
///
/// # Examples
///
/// ```
/// use stratocache_core::{memory_weigher, Weigher};
///
/// let weigher: Weigher<u64, String> = memory_weigher();
/// let value = String::with_capacity(100);
/// assert!(weigher(&1, &value) >= 100);
/// ```
pub fn memory_weigher<K, V>() -> Weigher<K, V>
where
    K: MemoryEstimator + 'static,
    V: MemoryEstimator + 'static,
{
    Arc::new(|key: &K, value: &V| {
        let bytes = key.estimate_memory().saturating_add(value.estimate_memory());
        u64::try_from(bytes).unwrap_or(u64::MAX)
    })
}

/// Estimates the memory footprint of a value in bytes.
///
/// The default implementation returns the inline size of the value, which is
/// exact for types without heap allocations. Types that own heap memory
/// override it to add their allocation.
///
/// # Examples
///
/// ```
/// use stratocache_core::MemoryEstimator;
///
/// struct Document {
///     title: String,
///     body: Vec<u8>,
/// }
///
/// impl MemoryEstimator for Document {
///     fn estimate_memory(&self) -> usize {
///         std::mem::size_of::<Self>() + self.title.capacity() + self.body.capacity()
///     }
/// }
///
/// let doc = Document { title: "a".repeat(10), body: vec![0; 32] };
/// assert!(doc.estimate_memory() >= 42);
/// ```
pub trait MemoryEstimator {
    fn estimate_memory(&self) -> usize {
        std::mem::size_of_val(self)
    }
}

macro_rules! inline_only {
    ($($ty:ty),* $(,)?) => {
        $(impl MemoryEstimator for $ty {})*
    };
}

inline_only!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, ()
);

impl MemoryEstimator for String {
    fn estimate_memory(&self) -> usize {
        size_of::<Self>() + self.capacity()
    }
}

impl MemoryEstimator for &str {
    fn estimate_memory(&self) -> usize {
        size_of::<Self>() + self.len()
    }
}

impl<T: MemoryEstimator> MemoryEstimator for Vec<T> {
    fn estimate_memory(&self) -> usize {
        let unused = (self.capacity() - self.len()) * size_of::<T>();
        size_of::<Self>() + unused + self.iter().map(T::estimate_memory).sum::<usize>()
    }
}

impl<T: MemoryEstimator> MemoryEstimator for Option<T> {
    fn estimate_memory(&self) -> usize {
        match self {
            // the payload's inline size is already part of the option
            Some(value) => size_of::<Self>() - size_of::<T>() + value.estimate_memory(),
            None => size_of::<Self>(),
        }
    }
}

impl<T: MemoryEstimator + ?Sized> MemoryEstimator for Box<T> {
    fn estimate_memory(&self) -> usize {
        size_of::<Self>() + (**self).estimate_memory()
    }
}

impl<T: MemoryEstimator + ?Sized> MemoryEstimator for Arc<T> {
    fn estimate_memory(&self) -> usize {
        // shared allocation, counted once per handle
        size_of::<Self>() + (**self).estimate_memory()
    }
}

impl<A: MemoryEstimator, B: MemoryEstimator> MemoryEstimator for (A, B) {
    fn estimate_memory(&self) -> usize {
        size_of::<Self>() - size_of::<A>() - size_of::<B>()
            + self.0.estimate_memory()
            + self.1.estimate_memory()
    }
}

impl<K, V, S> MemoryEstimator for HashMap<K, V, S>
where
    K: MemoryEstimator,
    V: MemoryEstimator,
{
    fn estimate_memory(&self) -> usize {
        let slots = self.capacity() * (size_of::<K>() + size_of::<V>());
        let heap: usize = self
            .iter()
            .map(|(k, v)| {
                k.estimate_memory().saturating_sub(size_of::<K>())
                    + v.estimate_memory().saturating_sub(size_of::<V>())
            })
            .sum();
        size_of::<Self>() + slots + heap
    }
}
