//! Max-priority frontier of partial walks keyed by upper bound.
//!
//! Equal bounds pop in insertion order (a per-push sequence number breaks
//! ties), which keeps whole searches reproducible for a fixed input.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

/// Anything the frontier can order: exposes its admissible upper bound.
pub trait Bounded {
    fn upper_bound(&self) -> f64;
}

/// `pop` on an empty frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyFrontier;

impl fmt::Display for EmptyFrontier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pop from an empty frontier")
    }
}

impl std::error::Error for EmptyFrontier {}

struct Entry<S> {
    bound: f64,
    seq: u64,
    state: S,
}

impl<S> PartialEq for Entry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S> Eq for Entry<S> {}

impl<S> PartialOrd for Entry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Entry<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Larger bound first; among equals, the older entry (smaller seq) first.
        self.bound
            .total_cmp(&other.bound)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Best-first queue used by the search loop. No deduplication.
pub struct PriorityFrontier<S> {
    heap: BinaryHeap<Entry<S>>,
    next_seq: u64,
}

impl<S> Default for PriorityFrontier<S> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<S: Bounded> PriorityFrontier<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, state: S) {
        let bound = state.upper_bound();
        debug_assert!(!bound.is_nan(), "frontier bound must not be NaN");
        self.heap.push(Entry {
            bound,
            seq: self.next_seq,
            state,
        });
        self.next_seq += 1;
    }

    pub fn pop(&mut self) -> Result<S, EmptyFrontier> {
        self.heap.pop().map(|e| e.state).ok_or(EmptyFrontier)
    }

    /// Bound of the entry `pop` would return next.
    pub fn peek_bound(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.bound)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Total number of pushes over the frontier's lifetime.
    #[inline]
    pub fn pushed(&self) -> u64 {
        self.next_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item(f64, &'static str);

    impl Bounded for Item {
        fn upper_bound(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn pops_max_first_then_fifo_on_ties() {
        let mut q = PriorityFrontier::new();
        q.push(Item(0.5, "a"));
        q.push(Item(0.9, "b"));
        q.push(Item(0.5, "c"));
        q.push(Item(0.9, "d"));
        q.push(Item(0.1, "e"));
        assert_eq!(q.len(), 5);
        assert_eq!(q.peek_bound(), Some(0.9));
        let order: Vec<_> = std::iter::from_fn(|| q.pop().ok()).map(|i| i.1).collect();
        assert_eq!(order, vec!["b", "d", "a", "c", "e"]);
        assert!(q.is_empty());
        assert_eq!(q.pushed(), 5);
    }

    #[test]
    fn empty_pop_is_an_error() {
        let mut q: PriorityFrontier<Item> = PriorityFrontier::new();
        assert_eq!(q.pop(), Err(EmptyFrontier));
        assert_eq!(q.peek_bound(), None);
    }
}
