use crate::{CacheEntry, EntryStore};
use std::hash::Hash;

/// Finds the key with the smallest score among the entries of the store.
///
/// This utility function is used by the LRU, LFU and FIFO strategies to pick
/// an eviction candidate.
///
/// # Arguments
///
/// * `entries` - The entry store to scan
/// * `score` - Returns the score of a key, or `None` to exclude it
///
/// # Behavior
///
/// - Visits every entry once, in the store's iteration order
/// - Keys for which `score` returns `None` are skipped
/// - In case of ties, the first key encountered wins; since the store's
///   iteration order is unspecified, so is the winner among equal scores
///
/// # Performance
///
/// O(n) in the number of stored entries. Each shard of the store is read-locked
/// while it is visited, so `score` must not write to the store.
///
/// # Examples
///
/// ```
/// use dashmap::DashMap;
/// use std::sync::Arc;
/// use stratocache_core::{CacheEntry, EntryStore, utils::find_min_key};
///
/// let store: EntryStore<&str, u32> = DashMap::new();
/// store.insert("a", Arc::new(CacheEntry::new(10, 5, None)));
/// store.insert("b", Arc::new(CacheEntry::new(20, 2, None)));
///
/// let lightest = find_min_key(&store, |_, entry| Some(entry.weight()));
/// assert_eq!(lightest, Some("b"));
/// ```
pub fn find_min_key<K, V, S, F>(entries: &EntryStore<K, V>, mut score: F) -> Option<K>
where
    K: Eq + Hash + Clone,
    S: Ord,
    F: FnMut(&K, &CacheEntry<V>) -> Option<S>,
{
    let mut best: Option<(K, S)> = None;
    for item in entries.iter() {
        let Some(candidate) = score(item.key(), item.value().as_ref()) else {
            continue;
        };
        match &best {
            Some((_, current)) if candidate >= *current => {}
            _ => best = Some((item.key().clone(), candidate)),
        }
    }
    best.map(|(key, _)| key)
}

/// Finds the key with the largest score among the entries of the store.
///
/// Mirror of [`find_min_key`], used by the MRU, FILO, idle-time and weight
/// strategies. Ties keep the first key encountered.
///
/// # Examples
///
/// ```
/// use dashmap::DashMap;
/// use std::sync::Arc;
/// use stratocache_core::{CacheEntry, EntryStore, utils::find_max_key};
///
/// let store: EntryStore<&str, u32> = DashMap::new();
/// store.insert("a", Arc::new(CacheEntry::new(10, 5, None)));
/// store.insert("b", Arc::new(CacheEntry::new(20, 2, None)));
///
/// let heaviest = find_max_key(&store, |_, entry| Some(entry.weight()));
/// assert_eq!(heaviest, Some("a"));
///
/// // Excluding every key yields no candidate
/// assert_eq!(find_max_key(&store, |_, _| None::<u64>), None);
/// ```
pub fn find_max_key<K, V, S, F>(entries: &EntryStore<K, V>, mut score: F) -> Option<K>
where
    K: Eq + Hash + Clone,
    S: Ord,
    F: FnMut(&K, &CacheEntry<V>) -> Option<S>,
{
    let mut best: Option<(K, S)> = None;
    for item in entries.iter() {
        let Some(candidate) = score(item.key(), item.value().as_ref()) else {
            continue;
        };
        match &best {
            Some((_, current)) if candidate <= *current => {}
            _ => best = Some((item.key().clone(), candidate)),
        }
    }
    best.map(|(key, _)| key)
}

/// Sums the weights of every entry in the store.
///
/// This is the full scan the weight bound is checked against.
pub fn total_weight<K, V>(entries: &EntryStore<K, V>) -> u64
where
    K: Eq + Hash,
{
    entries
        .iter()
        .fold(0u64, |acc, item| acc.saturating_add(item.value().weight()))
}
