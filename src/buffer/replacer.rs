//! LRU replacement policy for the buffer pool.

use indexmap::IndexSet;
use std::hash::Hash;

/// Tracks recency order over a set of keys and selects the
/// least-recently-used one for eviction.
///
/// Keys are ordered by recency inside an [`IndexSet`]: the front is the
/// least-recently-used key, the back is the most-recently-used. Every
/// access (hit or miss-then-insert) moves its key to the back.
pub struct LruReplacer<K> {
    order: IndexSet<K>,
}

impl<K: Eq + Hash + Clone> LruReplacer<K> {
    pub fn new() -> Self {
        Self { order: IndexSet::new() }
    }

    /// Record an access to `key`, making it the most-recently-used.
    pub fn record_access(&mut self, key: K) {
        self.order.shift_remove(&key);
        self.order.insert(key);
    }

    /// Stop tracking `key` entirely (used when a page is dropped from
    /// the pool for a reason other than LRU eviction, e.g. a drop-table).
    pub fn remove(&mut self, key: &K) {
        self.order.shift_remove(key);
    }

    /// Select and remove the least-recently-used key, if any is tracked.
    pub fn evict(&mut self) -> Option<K> {
        if self.order.is_empty() {
            return None;
        }
        self.order.shift_remove_index(0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for LruReplacer<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let mut r = LruReplacer::new();
        r.record_access(1);
        r.record_access(2);
        r.record_access(3);
        assert_eq!(r.evict(), Some(1));
        assert_eq!(r.evict(), Some(2));
    }

    #[test]
    fn test_reaccess_moves_to_back() {
        let mut r = LruReplacer::new();
        r.record_access(1);
        r.record_access(2);
        r.record_access(1);
        assert_eq!(r.evict(), Some(2));
        assert_eq!(r.evict(), Some(1));
    }

    #[test]
    fn test_remove_untracks_key() {
        let mut r = LruReplacer::new();
        r.record_access(1);
        r.record_access(2);
        r.remove(&1);
        assert_eq!(r.evict(), Some(2));
        assert_eq!(r.evict(), None);
    }

    #[test]
    fn test_empty_evict_is_none() {
        let mut r: LruReplacer<i32> = LruReplacer::new();
        assert_eq!(r.evict(), None);
    }
}
