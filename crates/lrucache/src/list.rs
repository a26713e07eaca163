//! Recency list for the LRU cache
//!
//! Doubly-linked list whose nodes live in a slot arena and link to each
//! other by slot index, so there is no shared ownership between neighbours.
//! The head is the most recently used entry, the tail the least.

use crate::error::{Error, Result};

/// Node in the recency list
struct Entry<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena-backed doubly-linked list, mutated only by `LruCache`
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn key(&self, idx: usize) -> Option<&K> {
        self.entry(idx).map(|entry| &entry.key)
    }

    pub(crate) fn value(&self, idx: usize) -> Option<&V> {
        self.entry(idx).map(|entry| &entry.value)
    }

    /// Link a new entry in as the head and return its slot
    pub(crate) fn push_front(&mut self, key: K, value: V) -> usize {
        let idx = self.alloc_slot();
        self.slots[idx] = Some(Entry {
            key,
            value,
            prev: None,
            next: self.head,
        });

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.slots[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.len += 1;
        idx
    }

    /// Relink an existing entry as the head
    pub(crate) fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) || self.entry(idx).is_none() {
            return;
        }

        self.unlink(idx);

        let old_head = self.head;
        if let Some(entry) = &mut self.slots[idx] {
            entry.prev = None;
            entry.next = old_head;
        }

        if let Some(head_idx) = old_head {
            if let Some(head) = &mut self.slots[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
    }

    /// Unlink the tail and hand back its key and value
    ///
    /// The list must not be empty.
    pub(crate) fn pop_back(&mut self) -> Option<(K, V)> {
        debug_assert!(!self.is_empty(), "pop_back on an empty recency list");

        let tail_idx = self.tail?;
        self.unlink(tail_idx);
        let entry = self.slots[tail_idx].take()?;
        self.free_list.push(tail_idx);
        self.len -= 1;

        Some((entry.key, entry.value))
    }

    /// Head-to-tail traversal
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Walk the list in both directions and verify every link
    pub(crate) fn check(&self) -> Result<()> {
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        if occupied != self.len {
            return Err(Error::invariant(format!(
                "{} occupied slots but length is {}",
                occupied, self.len
            )));
        }
        if occupied + self.free_list.len() != self.slots.len() {
            return Err(Error::invariant(format!(
                "{} occupied + {} free slots != {} total",
                occupied,
                self.free_list.len(),
                self.slots.len()
            )));
        }

        let mut steps = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            if steps == self.len {
                return Err(Error::invariant("forward walk longer than length"));
            }
            let entry = self.linked_entry(idx)?;
            if entry.prev != prev {
                return Err(Error::invariant(format!(
                    "slot {} has prev {:?}, expected {:?}",
                    idx, entry.prev, prev
                )));
            }
            prev = Some(idx);
            cursor = entry.next;
            steps += 1;
        }
        if steps != self.len {
            return Err(Error::invariant(format!(
                "forward walk took {} steps, length is {}",
                steps, self.len
            )));
        }
        if prev != self.tail {
            return Err(Error::invariant(format!(
                "forward walk ended at {:?}, tail is {:?}",
                prev, self.tail
            )));
        }

        let mut steps = 0;
        let mut next = None;
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            if steps == self.len {
                return Err(Error::invariant("backward walk longer than length"));
            }
            let entry = self.linked_entry(idx)?;
            if entry.next != next {
                return Err(Error::invariant(format!(
                    "slot {} has next {:?}, expected {:?}",
                    idx, entry.next, next
                )));
            }
            next = Some(idx);
            cursor = entry.prev;
            steps += 1;
        }
        if steps != self.len || next != self.head {
            return Err(Error::invariant(format!(
                "backward walk took {} steps ending at {:?}, head is {:?}",
                steps, next, self.head
            )));
        }

        Ok(())
    }

    fn entry(&self, idx: usize) -> Option<&Entry<K, V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn linked_entry(&self, idx: usize) -> Result<&Entry<K, V>> {
        self.entry(idx)
            .ok_or_else(|| Error::invariant(format!("slot {} is linked but vacant", idx)))
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.slots[idx] {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_entry) = &mut self.slots[prev_idx] {
                    prev_entry.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_entry) = &mut self.slots[next_idx] {
                    next_entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(None);
            idx
        }
    }
}

/// Iterator over cache entries from most to least recently used
///
/// Created by [`LruCache::iter`](crate::LruCache::iter). Walking does not
/// change recency.
pub struct Iter<'a, K, V> {
    slots: &'a [Option<Entry<K, V>>],
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.cursor?;
        let slots: &'a [Option<Entry<K, V>>] = self.slots;
        let entry = slots.get(idx)?.as_ref()?;
        self.cursor = entry.next;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &RecencyList<u32, &str>) -> Vec<u32> {
        list.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_list_empty() {
        let list: RecencyList<u32, &str> = RecencyList::with_capacity(4);

        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
        assert!(list.check().is_ok());
    }

    #[test]
    fn test_list_push_front() {
        let mut list = RecencyList::with_capacity(4);

        let a = list.push_front(1, "a");
        assert_eq!(list.head, Some(a));
        assert_eq!(list.tail, Some(a));

        list.push_front(2, "b");
        list.push_front(3, "c");

        assert_eq!(keys(&list), vec![3, 2, 1]);
        assert_eq!(list.tail, Some(a));
        assert_eq!(list.len(), 3);
        assert!(list.check().is_ok());
    }

    #[test]
    fn test_list_move_middle_to_front() {
        let mut list = RecencyList::with_capacity(4);
        list.push_front(1, "a");
        let b = list.push_front(2, "b");
        list.push_front(3, "c");

        list.move_to_front(b);

        assert_eq!(keys(&list), vec![2, 3, 1]);
        assert!(list.check().is_ok());
    }

    #[test]
    fn test_list_move_tail_to_front() {
        let mut list = RecencyList::with_capacity(4);
        let a = list.push_front(1, "a");
        let b = list.push_front(2, "b");
        list.push_front(3, "c");

        list.move_to_front(a);

        assert_eq!(keys(&list), vec![1, 3, 2]);
        assert_eq!(list.tail, Some(b));
        assert!(list.check().is_ok());
    }

    #[test]
    fn test_list_move_head_is_noop() {
        let mut list = RecencyList::with_capacity(4);
        list.push_front(1, "a");
        let b = list.push_front(2, "b");

        list.move_to_front(b);

        assert_eq!(keys(&list), vec![2, 1]);
        assert!(list.check().is_ok());
    }

    #[test]
    fn test_list_move_single_entry() {
        let mut list = RecencyList::with_capacity(1);
        let a = list.push_front(1, "a");

        list.move_to_front(a);

        assert_eq!(list.head, Some(a));
        assert_eq!(list.tail, Some(a));
        assert!(list.check().is_ok());
    }

    #[test]
    fn test_list_pop_back_order() {
        let mut list = RecencyList::with_capacity(4);
        list.push_front(1, "a");
        list.push_front(2, "b");
        list.push_front(3, "c");

        assert_eq!(list.pop_back(), Some((1, "a")));
        assert_eq!(list.pop_back(), Some((2, "b")));
        assert!(list.check().is_ok());
        assert_eq!(list.pop_back(), Some((3, "c")));

        assert!(list.is_empty());
        assert_eq!(list.head, None);
        assert_eq!(list.tail, None);
        assert!(list.check().is_ok());
    }

    #[test]
    fn test_list_recycles_slots() {
        let mut list = RecencyList::with_capacity(2);
        list.push_front(1, "a");
        list.push_front(2, "b");
        list.pop_back();

        let c = list.push_front(3, "c");

        assert_eq!(c, 0);
        assert_eq!(list.slots.len(), 2);
        assert_eq!(list.key(c), Some(&3));
        assert_eq!(list.value(c), Some(&"c"));
        assert_eq!(keys(&list), vec![3, 2]);
        assert!(list.check().is_ok());
    }

    #[test]
    fn test_list_iter_restartable() {
        let mut list = RecencyList::with_capacity(3);
        list.push_front(1, "a");
        list.push_front(2, "b");

        let iter = list.iter();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();

        assert_eq!(first, second);
        assert_eq!(first, vec![(&2, &"b"), (&1, &"a")]);
    }

    #[test]
    fn test_list_iter_exact_size() {
        let mut list = RecencyList::with_capacity(3);
        list.push_front(1, "a");
        list.push_front(2, "b");
        list.push_front(3, "c");

        let mut iter = list.iter();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        iter.next();
        assert_eq!(iter.len(), 2);
        iter.next();
        iter.next();
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_list_check_detects_broken_link() {
        let mut list = RecencyList::with_capacity(3);
        list.push_front(1, "a");
        let b = list.push_front(2, "b");
        list.push_front(3, "c");

        if let Some(entry) = &mut list.slots[b] {
            entry.prev = None;
        }

        assert!(matches!(list.check(), Err(Error::Invariant(_))));
    }
}
