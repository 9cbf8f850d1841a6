// src/cache.rs
//
// Bounded LRU cache for parsed player pages, keyed by page number.
// Recency is a plain key vector (oldest first); capacities are single
// digits, so the O(n) reorder is noise next to a page fetch.

use crate::player::Player;
use std::collections::HashMap;

pub struct PageCache {
    capacity: usize,
    /// Keys in recency order, least recently used first.
    order: Vec<u32>,
    pages: HashMap<u32, Vec<Player>>,
}

impl PageCache {
    /// `capacity` must be >= 1; config validation guarantees it.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: Vec::with_capacity(capacity),
            pages: HashMap::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Membership test. No recency side effect.
    pub fn contains(&self, key: u32) -> bool {
        self.pages.contains_key(&key)
    }

    /// Look up a page; a hit becomes the most recently used entry.
    /// `None` means "not resident", which is distinct from a resident
    /// page that happens to be empty.
    pub fn get(&mut self, key: u32) -> Option<&[Player]> {
        if !self.pages.contains_key(&key) {
            return None;
        }
        self.touch(key);
        self.pages.get(&key).map(|p| p.as_slice())
    }

    /// Insert a page. Re-inserting an existing key refreshes its recency
    /// without changing occupancy. A new key at capacity evicts the
    /// least recently used entry first.
    pub fn insert(&mut self, key: u32, page: Vec<Player>) {
        if self.pages.contains_key(&key) {
            self.touch(key);
            self.pages.insert(key, page);
            return;
        }
        if self.order.len() >= self.capacity {
            let lru = self.order.remove(0);
            self.pages.remove(&lru);
            logd!("page cache: evicted page {lru}");
        }
        self.order.push(key);
        self.pages.insert(key, page);
    }

    /// Resident `(page_number, players)` pairs, least recently used first.
    pub fn entries(&self) -> impl Iterator<Item = (u32, &[Player])> + '_ {
        self.order
            .iter()
            .filter_map(|k| self.pages.get(k).map(|p| (*k, p.as_slice())))
    }

    fn touch(&mut self, key: u32) {
        if let Some(pos) = self.order.iter().position(|&k| k == key) {
            self.order.remove(pos);
            self.order.push(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;

    fn page(tag: &str, n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player {
                name: format!("{tag}-{i}"),
                role: s!("Goalkeeper"),
                age: 20 + i as u32,
                nationality: s!("Brazil"),
                club: s!("Santos"),
                price: s!("€1.00m"),
            })
            .collect()
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut c = PageCache::new(3);
        for k in 1..=10 {
            c.insert(k, page("p", 2));
            assert!(c.len() <= 3);
        }
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut c = PageCache::new(2);
        c.insert(1, page("a", 1));
        c.insert(2, page("b", 1));
        c.insert(3, page("c", 1));
        assert!(!c.contains(1));
        assert!(c.contains(2));
        assert!(c.contains(3));
    }

    #[test]
    fn get_refreshes_recency() {
        let mut c = PageCache::new(2);
        c.insert(1, page("a", 1));
        c.insert(2, page("b", 1));
        assert!(c.get(1).is_some()); // 1 is now newest
        c.insert(3, page("c", 1)); // evicts 2, not 1
        assert!(c.contains(1));
        assert!(!c.contains(2));
        assert!(c.contains(3));
    }

    #[test]
    fn reinsert_keeps_size_and_moves_to_newest() {
        let mut c = PageCache::new(2);
        c.insert(1, page("a", 1));
        c.insert(2, page("b", 1));
        c.insert(1, page("a2", 1)); // refresh, no eviction
        assert_eq!(c.len(), 2);
        c.insert(3, page("c", 1)); // 2 is now LRU
        assert!(c.contains(1));
        assert!(!c.contains(2));
        assert_eq!(c.get(1).unwrap()[0].name, "a2-0");
    }

    #[test]
    fn contains_has_no_recency_side_effect() {
        let mut c = PageCache::new(2);
        c.insert(1, page("a", 1));
        c.insert(2, page("b", 1));
        assert!(c.contains(1)); // must not refresh 1
        c.insert(3, page("c", 1));
        assert!(!c.contains(1));
    }

    #[test]
    fn miss_is_distinct_from_empty_page() {
        let mut c = PageCache::new(2);
        c.insert(7, Vec::new());
        assert!(c.get(7).is_some_and(|p| p.is_empty()));
        assert!(c.get(8).is_none());
    }

    #[test]
    fn entries_in_recency_order_oldest_first() {
        let mut c = PageCache::new(3);
        c.insert(1, page("a", 1));
        c.insert(2, page("b", 1));
        c.insert(3, page("c", 1));
        let _ = c.get(1);
        let keys: Vec<u32> = c.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![2, 3, 1]);
    }

    #[test]
    fn capacity_one_holds_latest() {
        let mut c = PageCache::new(1);
        c.insert(1, page("a", 1));
        c.insert(2, page("b", 1));
        assert_eq!(c.len(), 1);
        assert!(c.contains(2));
    }
}
