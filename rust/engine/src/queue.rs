// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Priority queue that orders only when popping.
//!
//! Priorities of queued patches change every tick (gaze recency), so keeping
//! a heap up to date would mean re-sifting on every change. The queue is a
//! plain insertion-ordered list and the comparator runs once per pop.

use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct LazyPriorityQueue<T> {
    items: Vec<T>,
}

impl<T> Default for LazyPriorityQueue<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: PartialEq> LazyPriorityQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item. Returns false if it is already queued.
    pub fn push(&mut self, item: T) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Removes an item wherever it sits.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.items.iter().position(|i| i == item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Removes and returns the smallest item under `compare`.
    ///
    /// Ties go to the item queued first.
    pub fn pop_min_by<F>(&mut self, mut compare: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut best = 0;
        for index in 1..self.items.len() {
            if compare(&self.items[index], &self.items[best]) == Ordering::Less {
                best = index;
            }
        }
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(best))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_removes_the_minimum() {
        let mut queue = LazyPriorityQueue::new();
        for x in [5, 3, 8, 3, 1] {
            queue.push(x);
        }
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.pop_min_by(|a, b| a.cmp(b)), Some(1));
        assert_eq!(queue.pop_min_by(|a, b| a.cmp(b)), Some(3));
        assert_eq!(queue.len(), 2);
        assert!(!queue.contains(&3));
    }

    #[test]
    fn priority_is_evaluated_at_pop_time() {
        let mut queue = LazyPriorityQueue::new();
        queue.push('a');
        queue.push('b');
        let mut weights = [('a', 1), ('b', 2)];
        weights[1].1 = 0;
        let weight = |c: &char| weights.iter().find(|(k, _)| k == c).map(|(_, w)| *w);
        assert_eq!(queue.pop_min_by(|x, y| weight(x).cmp(&weight(y))), Some('b'));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut queue = LazyPriorityQueue::new();
        queue.push("first");
        queue.push("second");
        assert_eq!(queue.pop_min_by(|_, _| Ordering::Equal), Some("first"));
    }

    #[test]
    fn empty_and_remove() {
        let mut queue: LazyPriorityQueue<u32> = LazyPriorityQueue::new();
        assert_eq!(queue.pop_min_by(|a, b| a.cmp(b)), None);
        queue.push(7);
        assert!(queue.remove(&7));
        assert!(!queue.remove(&7));
        assert!(queue.is_empty());
    }
}
