//! Domination table: best objective seen per unordered pair of expansion nodes.
//!
//! A pair is the two nodes added at the two ends during one expansion step;
//! an end that did not expand contributes `None`. Pruning only, so a missing
//! entry never changes which walks are admissible.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Unordered pair `{a, b}`; `PairKey::new(a, b) == PairKey::new(b, a)`.
#[derive(Clone, Debug)]
pub struct PairKey<N> {
    a: Option<N>,
    b: Option<N>,
}

impl<N: Eq> PairKey<N> {
    pub fn new(a: Option<N>, b: Option<N>) -> Self {
        Self { a, b }
    }

    /// Both sides name the same node (a closure, never tabled).
    pub fn is_degenerate(&self) -> bool {
        self.a == self.b
    }
}

impl<N: Eq> PartialEq for PairKey<N> {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

impl<N: Eq> Eq for PairKey<N> {}

impl<N: Hash> Hash for PairKey<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent: combine the two element hashes commutatively.
        let side = |x: &Option<N>| {
            let mut h = DefaultHasher::new();
            x.hash(&mut h);
            h.finish()
        };
        state.write_u64(side(&self.a).wrapping_add(side(&self.b)));
    }
}

/// Memo of the best objective per expansion pair. Grows monotonically.
#[derive(Clone, Debug)]
pub struct DominationTable<N> {
    best: HashMap<PairKey<N>, f64>,
}

impl<N> Default for DominationTable<N> {
    fn default() -> Self {
        Self {
            best: HashMap::new(),
        }
    }
}

impl<N: Eq + Hash> DominationTable<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded value, or negative infinity if the pair was never seen.
    pub fn get(&self, key: &PairKey<N>) -> f64 {
        self.best.get(key).copied().unwrap_or(f64::NEG_INFINITY)
    }

    pub fn set(&mut self, key: PairKey<N>, value: f64) {
        self.best.insert(key, value);
    }

    /// Record `value` if it strictly beats the entry for `key`; reports whether it did.
    pub fn improve(&mut self, key: PairKey<N>, value: f64) -> bool {
        if value > self.get(&key) {
            self.set(key, value);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_unordered() {
        let mut dt = DominationTable::new();
        dt.set(PairKey::new(Some(1), Some(2)), 0.4);
        assert_eq!(dt.get(&PairKey::new(Some(2), Some(1))), 0.4);
        assert_eq!(dt.get(&PairKey::new(Some(1), None)), f64::NEG_INFINITY);
        dt.set(PairKey::new(None, Some(1)), 0.1);
        assert_eq!(dt.get(&PairKey::new(Some(1), None)), 0.1);
        assert_eq!(dt.len(), 2);
    }

    #[test]
    fn improve_requires_strict_gain() {
        let mut dt = DominationTable::new();
        let k = || PairKey::new(Some('x'), Some('y'));
        assert!(dt.improve(k(), 0.0));
        assert!(!dt.improve(k(), 0.0));
        assert!(dt.improve(PairKey::new(Some('y'), Some('x')), 0.3));
        assert!(!dt.improve(k(), 0.2));
        assert_eq!(dt.get(&k()), 0.3);
    }

    #[test]
    fn degenerate_pairs() {
        assert!(PairKey::new(Some(3), Some(3)).is_degenerate());
        assert!(!PairKey::new(Some(3), None).is_degenerate());
    }
}
