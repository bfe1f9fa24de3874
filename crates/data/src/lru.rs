//! A small hand-rolled LRU map used by both [`crate::FileStatCache`] and
//! [`crate::store::OhlcvStore`]'s frame cache. Recency is tracked by
//! insertion order in an [`indexmap::IndexMap`]: a hit moves its entry to
//! the back; eviction removes from the front.

use indexmap::IndexMap;
use std::hash::Hash;

#[derive(Debug)]
pub struct LruCache<K, V> {
    map: IndexMap<K, V>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            map: IndexMap::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Looks up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if let Some(index) = self.map.get_index_of(key) {
            let (k, v) = self.map.shift_remove_index(index).expect("index exists");
            self.map.insert(k, v);
            // Re-fetch: insert appended at the back, so the entry is last.
            self.map.get(key)
        } else {
            None
        }
    }

    /// Inserts `key` -> `value` as most-recently-used. Returns the
    /// evicted (key, value) pair if capacity was exceeded.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(index) = self.map.get_index_of(&key) {
            self.map.shift_remove_index(index);
        }
        self.map.insert(key, value);
        if self.map.len() > self.capacity {
            self.map.shift_remove_index(0)
        } else {
            None
        }
    }

    /// Evicts and returns the single least-recently-used entry, if any.
    pub fn evict_lru(&mut self) -> Option<(K, V)> {
        self.map.shift_remove_index(0)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.map.shift_remove(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.map.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_insert_evicts_when_over_capacity() {
        let mut cache: LruCache<u32, &str> = LruCache::new(2);
        assert!(cache.insert(1, "a").is_none());
        assert!(cache.insert(2, "b").is_none());
        let evicted = cache.insert(3, "c");
        assert_eq!(evicted, Some((1, "a")));
        assert_eq!(cache.len(), 2);
    }

    #[rstest]
    fn test_get_promotes_to_most_recently_used() {
        let mut cache: LruCache<u32, &str> = LruCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        // Touch 1, making 2 the least-recently-used.
        assert_eq!(cache.get(&1), Some(&"a"));
        let evicted = cache.insert(3, "c");
        assert_eq!(evicted, Some((2, "b")));
    }

    #[rstest]
    fn test_evict_lru_on_empty_is_none() {
        let mut cache: LruCache<u32, &str> = LruCache::new(2);
        assert!(cache.evict_lru().is_none());
    }
}
