//! Fixed-capacity least-recently-used cache with batched eviction

use hashbrown::HashMap;
use std::hash::Hash;

/// Entries are stamped with a use counter. Inserting past capacity drops the
/// `trim_batch` least recently used entries in one pass.
#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: HashMap<K, (V, u64)>,
    capacity: usize,
    trim_batch: usize,
    tick: u64,
    hits: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    pub fn new(capacity: usize, trim_batch: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity + 1),
            capacity,
            trim_batch: trim_batch.clamp(1, capacity.max(1)),
            tick: 0,
            hits: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up and refresh an entry
    pub fn get(&mut self, key: &K) -> Option<V> {
        let tick = self.next_tick();
        let (value, used) = self.entries.get_mut(key)?;
        *used = tick;
        self.hits += 1;
        Some(value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        let tick = self.next_tick();
        self.entries.insert(key, (value, tick));
        if self.entries.len() > self.capacity {
            self.trim();
        }
    }

    fn trim(&mut self) {
        let mut ticks: Vec<u64> = self.entries.values().map(|(_, used)| *used).collect();
        let cut = self.trim_batch.min(ticks.len());
        ticks.select_nth_unstable(cut - 1);
        let threshold = ticks[cut - 1];
        self.entries.retain(|_, (_, used)| *used > threshold);
        tracing::debug!(removed = cut, remaining = self.entries.len(), "Trimmed LRU cache");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of successful lookups since creation or the last clear
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_in_batches_when_over_capacity() {
        let mut cache = LruCache::new(10, 4);
        for i in 0..10 {
            cache.insert(i, i);
        }
        assert_eq!(cache.len(), 10);

        cache.insert(10, 10);
        assert_eq!(cache.len(), 7);
        // Oldest four went first
        for i in 0..4 {
            assert_eq!(cache.get(&i), None);
        }
        assert_eq!(cache.get(&4), Some(4));
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = LruCache::new(3, 1);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        assert_eq!(cache.get(&"a"), Some(1));

        cache.insert("d", 4);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn counts_hits_only() {
        let mut cache: LruCache<&str, Option<u8>> = LruCache::new(5, 2);
        cache.insert("none", None);
        assert_eq!(cache.get(&"none"), Some(None));
        assert_eq!(cache.get(&"missing"), None);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn default_sizes_keep_most_recent_entries() {
        let mut cache = LruCache::new(2000, 500);
        for i in 0..2001 {
            cache.insert(i, ());
        }
        assert_eq!(cache.len(), 1501);
        assert!(cache.get(&2000).is_some());
        assert!(cache.get(&499).is_none());
        assert!(cache.get(&500).is_some());
    }
}
