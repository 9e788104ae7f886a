//! Key-based deduplication for listing results.

use std::collections::HashSet;
use std::hash::Hash;

/// Remove later duplicates from an ordered sequence.
///
/// Keeps the first occurrence per distinct key and preserves the original
/// relative order of the survivors. Later duplicates are dropped silently.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen: HashSet<K> = HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}
