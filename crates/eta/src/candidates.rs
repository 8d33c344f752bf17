//! Ranked candidate edges (`Ld`): the top-`sn` demand-bearing edges.
//!
//! - `edge(rank)` / `demand(rank)` walk the list in descending score order.
//! - `score_of(u, v)` answers "is `{u, v}` a candidate, and with which score".
//!   Absent means "not a candidate", never zero.
//! - Built once per search; `normalize` runs at most once, before any walk
//!   state is created.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::eta::SearchError;
use crate::graph::ScoredEdge;

/// How many top-scoring edges take part in seeding and bounding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedLimit {
    Top(usize),
    Unlimited,
}

impl SeedLimit {
    /// Command-line convention: `-1` is unlimited, positive values cap the list.
    pub fn from_signed(n: i64) -> Result<Self, SearchError> {
        match n {
            -1 => Ok(SeedLimit::Unlimited),
            n if n > 0 => Ok(SeedLimit::Top(n as usize)),
            n => Err(SearchError::InvalidSeedLimit { value: n }),
        }
    }

    fn cap(self) -> usize {
        match self {
            SeedLimit::Top(n) => n,
            SeedLimit::Unlimited => usize::MAX,
        }
    }
}

impl Default for SeedLimit {
    fn default() -> Self {
        SeedLimit::Top(5000)
    }
}

/// Candidate edges sorted by descending score, with an orientation-free lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateEdgeIndex<N: Eq + Hash> {
    edges: Vec<(N, N)>,
    demands: Vec<f64>,
    edge2score: HashMap<(N, N), f64>,
}

impl<N: Clone + Eq + Hash + fmt::Debug> CandidateEdgeIndex<N> {
    /// Validate, rank and truncate `scored` to `limit` entries.
    ///
    /// Ties keep their input order. Fails on non-finite or negative scores,
    /// self-loops, repeated undirected edges, a zero limit, or an empty result.
    pub fn build(scored: &[ScoredEdge<N>], limit: SeedLimit) -> Result<Self, SearchError> {
        if limit == SeedLimit::Top(0) {
            return Err(SearchError::InvalidSeedLimit { value: 0 });
        }
        let mut seen: HashSet<(&N, &N)> = HashSet::with_capacity(scored.len() * 2);
        for e in scored {
            if !e.score.is_finite() {
                return Err(SearchError::NonFiniteScore {
                    edge: edge_label(&e.u, &e.v),
                });
            }
            if e.score < 0.0 {
                return Err(SearchError::NegativeScore {
                    edge: edge_label(&e.u, &e.v),
                    score: e.score,
                });
            }
            if e.u == e.v {
                return Err(SearchError::SelfLoop {
                    node: format!("{:?}", e.u),
                });
            }
            if !seen.insert((&e.u, &e.v)) || !seen.insert((&e.v, &e.u)) {
                return Err(SearchError::DuplicateEdge {
                    edge: edge_label(&e.u, &e.v),
                });
            }
        }

        let mut ranked: Vec<&ScoredEdge<N>> = scored.iter().collect();
        // Stable: equal scores stay in input order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(limit.cap());
        if ranked.is_empty() {
            return Err(SearchError::InsufficientCandidates {
                found: 0,
                required: 1,
            });
        }

        let mut edges = Vec::with_capacity(ranked.len());
        let mut demands = Vec::with_capacity(ranked.len());
        let mut edge2score = HashMap::with_capacity(ranked.len() * 2);
        for e in ranked {
            edges.push((e.u.clone(), e.v.clone()));
            demands.push(e.score);
            edge2score.insert((e.u.clone(), e.v.clone()), e.score);
            edge2score.insert((e.v.clone(), e.u.clone()), e.score);
        }
        Ok(Self {
            edges,
            demands,
            edge2score,
        })
    }

    /// Score of candidate edge `{u, v}`; `None` if it is not among the retained edges.
    #[inline]
    pub fn score_of(&self, u: &N, v: &N) -> Option<f64> {
        self.edge2score.get(&(u.clone(), v.clone())).copied()
    }

    /// Fail unless at least `required` candidates were retained.
    pub fn require(&self, required: usize) -> Result<(), SearchError> {
        if self.len() < required {
            return Err(SearchError::InsufficientCandidates {
                found: self.len(),
                required,
            });
        }
        Ok(())
    }

    /// Divide every retained score by `sum(demands[..k])`; returns the divisor.
    ///
    /// A zero prefix sum leaves the scores untouched and returns `1.0`.
    pub fn normalize(&mut self, k: usize) -> f64 {
        let total = self.prefix_sum(k);
        if total <= 0.0 {
            return 1.0;
        }
        for d in &mut self.demands {
            *d /= total;
        }
        for s in self.edge2score.values_mut() {
            *s /= total;
        }
        total
    }
}

impl<N: Eq + Hash> CandidateEdgeIndex<N> {
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[inline]
    pub fn edge(&self, rank: usize) -> &(N, N) {
        &self.edges[rank]
    }

    #[inline]
    pub fn demand(&self, rank: usize) -> f64 {
        self.demands[rank]
    }

    pub fn demands(&self) -> &[f64] {
        &self.demands
    }

    /// Sum of the `k` best scores (`k` clamped to the list length).
    pub fn prefix_sum(&self, k: usize) -> f64 {
        self.demands[..k.min(self.demands.len())].iter().sum()
    }

    /// `(edge, score)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&(N, N), f64)> + '_ {
        self.edges.iter().zip(self.demands.iter().copied())
    }
}

fn edge_label<N: fmt::Debug>(u: &N, v: &N) -> String {
    format!("{{{u:?}, {v:?}}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ScoredEdge<&'static str>> {
        vec![
            ScoredEdge::new("a", "b", 2.0),
            ScoredEdge::new("b", "c", 5.0),
            ScoredEdge::new("c", "d", 2.0),
            ScoredEdge::new("d", "a", 7.0),
        ]
    }

    #[test]
    fn ranks_descending_with_stable_ties() {
        let ld = CandidateEdgeIndex::build(&sample(), SeedLimit::Unlimited).unwrap();
        assert_eq!(ld.len(), 4);
        assert_eq!(ld.demands(), &[7.0, 5.0, 2.0, 2.0]);
        assert_eq!(ld.edge(0), &("d", "a"));
        // a-b precedes c-d in the input, so it ranks first among the 2.0 ties.
        assert_eq!(ld.edge(2), &("a", "b"));
        assert_eq!(ld.edge(3), &("c", "d"));
    }

    #[test]
    fn truncation_limits_lookup() {
        let ld = CandidateEdgeIndex::build(&sample(), SeedLimit::Top(2)).unwrap();
        assert_eq!(ld.len(), 2);
        assert_eq!(ld.score_of(&"a", &"d"), Some(7.0));
        assert_eq!(ld.score_of(&"c", &"b"), Some(5.0));
        // Present in the graph but below the cut: not a candidate.
        assert_eq!(ld.score_of(&"a", &"b"), None);
        assert_eq!(ld.edge2score.len(), 2 * ld.len());
    }

    #[test]
    fn build_is_idempotent() {
        let a = CandidateEdgeIndex::build(&sample(), SeedLimit::Top(3)).unwrap();
        let b = CandidateEdgeIndex::build(&sample(), SeedLimit::Top(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_input() {
        let neg = [ScoredEdge::new(1, 2, -1.0)];
        assert!(matches!(
            CandidateEdgeIndex::build(&neg, SeedLimit::Unlimited),
            Err(SearchError::NegativeScore { .. })
        ));
        let nan = [ScoredEdge::new(1, 2, f64::NAN)];
        assert!(matches!(
            CandidateEdgeIndex::build(&nan, SeedLimit::Unlimited),
            Err(SearchError::NonFiniteScore { .. })
        ));
        let dup = [ScoredEdge::new(1, 2, 1.0), ScoredEdge::new(2, 1, 1.0)];
        assert!(matches!(
            CandidateEdgeIndex::build(&dup, SeedLimit::Unlimited),
            Err(SearchError::DuplicateEdge { .. })
        ));
        let empty: [ScoredEdge<u32>; 0] = [];
        assert!(matches!(
            CandidateEdgeIndex::build(&empty, SeedLimit::Unlimited),
            Err(SearchError::InsufficientCandidates { found: 0, .. })
        ));
        assert!(matches!(
            CandidateEdgeIndex::build(&sample(), SeedLimit::Top(0)),
            Err(SearchError::InvalidSeedLimit { value: 0 })
        ));
    }

    #[test]
    fn normalize_divides_by_prefix_sum() {
        let mut ld = CandidateEdgeIndex::build(&sample(), SeedLimit::Unlimited).unwrap();
        let div = ld.normalize(2);
        assert_eq!(div, 12.0);
        assert!((ld.demand(0) - 7.0 / 12.0).abs() < 1e-12);
        assert!((ld.score_of(&"c", &"d").unwrap() - 2.0 / 12.0).abs() < 1e-12);
        assert!((ld.prefix_sum(2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_skips_all_zero_scores() {
        let zeros = [ScoredEdge::new(1, 2, 0.0), ScoredEdge::new(2, 3, 0.0)];
        let mut ld = CandidateEdgeIndex::build(&zeros, SeedLimit::Unlimited).unwrap();
        assert_eq!(ld.normalize(2), 1.0);
        assert_eq!(ld.demands(), &[0.0, 0.0]);
    }

    #[test]
    fn seed_limit_signed_convention() {
        assert_eq!(SeedLimit::from_signed(-1).unwrap(), SeedLimit::Unlimited);
        assert_eq!(SeedLimit::from_signed(12).unwrap(), SeedLimit::Top(12));
        assert!(SeedLimit::from_signed(0).is_err());
        assert!(SeedLimit::from_signed(-3).is_err());
    }
}
