//! LRU (Least Recently Used) index and order list
//!
//! Slot-arena doubly-linked list for O(1) promotion and eviction, plus an
//! AHash index from key to slot. Not synchronized; [`crate::LruCache`] wraps
//! it in a lock.

use std::collections::HashMap;
use std::hash::Hash;
use ahash::RandomState;

use crate::error::{Error, Result};

/// Upper bound on up-front allocation, so huge capacities grow lazily
const PREALLOC_LIMIT: usize = 4096;

/// Node in the LRU doubly-linked list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Outcome of [`Lru::put`]
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Put<K, V> {
    /// Key was present; value replaced and promoted
    Updated,
    /// New key inserted without eviction
    Inserted,
    /// New key inserted; the former LRU entry was evicted
    Evicted(K, V),
}

/// Index plus recency list with a fixed capacity
pub(crate) struct Lru<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<K, V> Lru<K, V> {
    /// Number of resident entries
    pub fn len(&self) -> usize {
        self.map.len()
    }
}

impl<K, V> Lru<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty list holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "capacity is validated by the caller");
        let prealloc = capacity.min(PREALLOC_LIMIT);

        Self {
            map: HashMap::with_capacity_and_hasher(prealloc, RandomState::new()),
            nodes: Vec::with_capacity(prealloc),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    /// Look up a key and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Look up a key without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Check for a key without touching recency
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or update a key, evicting the LRU entry if the list overflows
    pub fn put(&mut self, key: K, value: V) -> Result<Put<K, V>> {
        if let Some(&idx) = self.map.get(&key) {
            match &mut self.nodes[idx] {
                Some(node) => node.value = value,
                None => {
                    return Err(Error::Corrupted(format!(
                        "index points at empty slot {}",
                        idx
                    )))
                }
            }
            self.move_to_front(idx);
            return Ok(Put::Updated);
        }

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.link_front(idx);
        self.map.insert(key, idx);

        if self.map.len() <= self.capacity {
            return Ok(Put::Inserted);
        }

        match self.pop_lru() {
            Some((key, value)) => Ok(Put::Evicted(key, value)),
            None => Err(Error::Corrupted(format!(
                "{} entries indexed but order list is empty",
                self.map.len()
            ))),
        }
    }

    /// Remove a key, returning its value if it was present
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        self.free_node(idx);
        self.nodes[idx].take().map(|node| node.value)
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let idx = self.tail?;
        self.unlink(idx);
        let node = self.nodes[idx].take()?;
        self.map.remove(&node.key);
        self.free_node(idx);
        Some((node.key, node.value))
    }

    /// Drop every entry and release all slots
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    /// Walk the whole list and cross-check it against the index
    pub fn check_invariants(&self) -> Result<()> {
        let indexed = self.map.len();
        if indexed > self.capacity {
            return Err(Error::Corrupted(format!(
                "{} entries exceed capacity {}",
                indexed, self.capacity
            )));
        }

        let mut walked = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self
                .nodes
                .get(idx)
                .and_then(Option::as_ref)
                .ok_or_else(|| Error::Corrupted(format!("link to empty slot {}", idx)))?;

            if node.prev != prev {
                return Err(Error::Corrupted(format!("slot {} has a broken back-link", idx)));
            }
            if self.map.get(&node.key) != Some(&idx) {
                return Err(Error::Corrupted(format!("slot {} is not indexed under its key", idx)));
            }

            walked += 1;
            if walked > indexed {
                return Err(Error::Corrupted(format!(
                    "order list is longer than the index ({} entries)",
                    indexed
                )));
            }

            prev = Some(idx);
            cursor = node.next;
        }

        if self.tail != prev {
            return Err(Error::Corrupted("tail does not point at the last node".into()));
        }
        if walked != indexed {
            return Err(Error::Corrupted(format!(
                "order list has {} entries, index has {}",
                walked, indexed
            )));
        }

        Ok(())
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);
        self.link_front(idx);
    }

    fn link_front(&mut self, idx: usize) {
        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &self.nodes[idx] {
            (node.prev, node.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    fn free_node(&mut self, idx: usize) {
        self.free_list.push(idx);
    }
}

/// Iterator over `(key, value)` pairs from most to least recently used
pub(crate) struct Iter<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    cursor: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes: &'a [Option<Node<K, V>>] = self.nodes;
        let node = nodes.get(self.cursor?)?.as_ref()?;
        self.cursor = node.next;
        Some((&node.key, &node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V>(lru: &Lru<i32, V>) -> Vec<i32> {
        lru.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_lru_basic() {
        let mut lru = Lru::new(2);

        lru.put(1, "a").unwrap();
        lru.put(2, "b").unwrap();

        assert_eq!(lru.get(&1), Some(&"a"));
        assert_eq!(lru.get(&2), Some(&"b"));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_lru_eviction() {
        let mut lru = Lru::new(2);

        assert_eq!(lru.put(1, "a").unwrap(), Put::Inserted);
        assert_eq!(lru.put(2, "b").unwrap(), Put::Inserted);
        assert_eq!(lru.put(3, "c").unwrap(), Put::Evicted(1, "a"));

        assert_eq!(lru.get(&1), None);
        assert_eq!(lru.get(&2), Some(&"b"));
        assert_eq!(lru.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_get_promotes() {
        let mut lru = Lru::new(2);

        lru.put(1, "a").unwrap();
        lru.put(2, "b").unwrap();
        lru.get(&1);
        assert_eq!(lru.put(3, "c").unwrap(), Put::Evicted(2, "b"));

        assert_eq!(lru.get(&1), Some(&"a"));
        assert_eq!(lru.get(&2), None);
        assert_eq!(lru.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_peek_does_not_promote() {
        let mut lru = Lru::new(2);

        lru.put(1, "a").unwrap();
        lru.put(2, "b").unwrap();
        assert_eq!(lru.peek(&1), Some(&"a"));
        assert_eq!(lru.put(3, "c").unwrap(), Put::Evicted(1, "a"));
    }

    #[test]
    fn test_lru_overwrite() {
        let mut lru = Lru::new(2);

        lru.put(1, "a").unwrap();
        lru.put(2, "b").unwrap();
        assert_eq!(lru.put(1, "z").unwrap(), Put::Updated);

        assert_eq!(lru.len(), 2);
        assert_eq!(keys(&lru), vec![1, 2]);
        assert_eq!(lru.peek(&1), Some(&"z"));
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = Lru::new(3);

        lru.put(1, "a").unwrap();
        lru.put(2, "b").unwrap();
        lru.put(3, "c").unwrap();

        assert_eq!(lru.remove(&2), Some("b"));
        assert_eq!(lru.remove(&2), None);
        assert_eq!(lru.len(), 2);
        assert_eq!(keys(&lru), vec![3, 1]);
        lru.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_pop_lru() {
        let mut lru = Lru::new(3);

        lru.put(1, "a").unwrap();
        lru.put(2, "b").unwrap();

        assert_eq!(lru.pop_lru(), Some((1, "a")));
        assert_eq!(lru.pop_lru(), Some((2, "b")));
        assert_eq!(lru.pop_lru(), None);
        lru.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = Lru::new(3);

        lru.put(1, "a").unwrap();
        lru.put(2, "b").unwrap();
        lru.clear();

        assert_eq!(lru.len(), 0);
        assert_eq!(lru.capacity, 3);
        assert!(lru.iter().next().is_none());

        lru.put(4, "d").unwrap();
        assert_eq!(keys(&lru), vec![4]);
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut lru = Lru::new(1);

        assert_eq!(lru.put(1, "a").unwrap(), Put::Inserted);
        assert_eq!(lru.put(1, "b").unwrap(), Put::Updated);
        assert_eq!(lru.put(2, "c").unwrap(), Put::Evicted(1, "b"));
        assert_eq!(keys(&lru), vec![2]);
        lru.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_slots_are_reused() {
        let mut lru = Lru::new(4);

        for i in 0..1000 {
            lru.put(i, i).unwrap();
            if i % 3 == 0 {
                lru.remove(&(i - 1));
            }
        }

        assert!(lru.nodes.len() <= 5);
        assert!(lru.len() <= 4);
        lru.check_invariants().unwrap();
    }

    #[test]
    fn test_lru_iter_order() {
        let mut lru = Lru::new(4);

        for i in 1..=4 {
            lru.put(i, ()).unwrap();
        }
        lru.get(&2);
        lru.put(3, ()).unwrap();

        assert_eq!(keys(&lru), vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_check_invariants_detects_broken_link() {
        let mut lru = Lru::new(3);

        lru.put(1, "a").unwrap();
        lru.put(2, "b").unwrap();
        lru.check_invariants().unwrap();

        if let Some(node) = &mut lru.nodes[0] {
            node.prev = None;
        }

        assert!(matches!(lru.check_invariants(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_check_invariants_detects_stale_index() {
        let mut lru = Lru::new(3);

        lru.put(1, "a").unwrap();
        lru.map.insert(7, 5);

        assert!(matches!(lru.check_invariants(), Err(Error::Corrupted(_))));
    }
}
