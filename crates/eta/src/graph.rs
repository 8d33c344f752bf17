//! Undirected scored graphs consumed by the search.
//!
//! - `WalkGraph`: the read-only view ETA needs (node count, neighbor lists).
//! - `ScoredEdge`: explicit edge record; `score` is the only field the search reads.
//! - `ScoredGraph`: adjacency-list implementation with insertion-ordered neighbors,
//!   so scans (and therefore tie-breaking) are deterministic.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Read-only graph view used by the search loop.
pub trait WalkGraph {
    type Node: Clone + Eq + Hash + fmt::Debug;

    fn node_count(&self) -> usize;

    /// Neighbors in a stable order. Unknown nodes have none.
    fn neighbors(&self, node: &Self::Node) -> &[Self::Node];
}

/// Undirected edge `{u, v}` with its demand score.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredEdge<N> {
    pub u: N,
    pub v: N,
    pub score: f64,
}

impl<N> ScoredEdge<N> {
    #[inline]
    pub fn new(u: N, v: N, score: f64) -> Self {
        Self { u, v, score }
    }
}

/// Errors raised while assembling a graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    SelfLoop { node: String },
    DuplicateEdge { u: String, v: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::SelfLoop { node } => write!(f, "self-loop on node {node}"),
            GraphError::DuplicateEdge { u, v } => write!(f, "edge {{{u}, {v}}} given twice"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Adjacency-list graph carrying one score per undirected edge.
#[derive(Clone, Debug)]
pub struct ScoredGraph<N> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    adj: Vec<Vec<N>>,
    edges: Vec<ScoredEdge<N>>,
    edge_of: HashMap<(usize, usize), usize>,
}

impl<N> Default for ScoredGraph<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            adj: Vec::new(),
            edges: Vec::new(),
            edge_of: HashMap::new(),
        }
    }
}

impl<N: Clone + Eq + Hash + fmt::Debug> ScoredGraph<N> {
    /// Build from an edge list; nodes appear in first-seen order.
    pub fn from_edges<I>(edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = ScoredEdge<N>>,
    {
        Self::with_nodes(std::iter::empty(), edges)
    }

    /// Build from explicit nodes (isolated ones included) followed by edges.
    pub fn with_nodes<I, E>(nodes: I, edges: E) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = N>,
        E: IntoIterator<Item = ScoredEdge<N>>,
    {
        let mut g = Self::default();
        for n in nodes {
            g.add_node(n);
        }
        for e in edges {
            g.add_edge(e)?;
        }
        Ok(g)
    }

    /// Insert `node` if absent; returns its dense index.
    pub fn add_node(&mut self, node: N) -> usize {
        if let Some(&i) = self.index.get(&node) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(node.clone(), i);
        self.nodes.push(node);
        self.adj.push(Vec::new());
        i
    }

    pub fn add_edge(&mut self, edge: ScoredEdge<N>) -> Result<(), GraphError> {
        if edge.u == edge.v {
            return Err(GraphError::SelfLoop {
                node: format!("{:?}", edge.u),
            });
        }
        let a = self.add_node(edge.u.clone());
        let b = self.add_node(edge.v.clone());
        let key = (a.min(b), a.max(b));
        if self.edge_of.contains_key(&key) {
            return Err(GraphError::DuplicateEdge {
                u: format!("{:?}", edge.u),
                v: format!("{:?}", edge.v),
            });
        }
        self.edge_of.insert(key, self.edges.len());
        self.adj[a].push(edge.v.clone());
        self.adj[b].push(edge.u.clone());
        self.edges.push(edge);
        Ok(())
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[ScoredEdge<N>] {
        &self.edges
    }

    pub fn contains(&self, node: &N) -> bool {
        self.index.contains_key(node)
    }

    /// Dense index of `node` (its position in `nodes()`).
    pub fn index_of(&self, node: &N) -> Option<usize> {
        self.index.get(node).copied()
    }

    /// Position of `{u, v}` in `edges()`, either orientation.
    pub fn edge_index(&self, u: &N, v: &N) -> Option<usize> {
        let a = self.index_of(u)?;
        let b = self.index_of(v)?;
        self.edge_of.get(&(a.min(b), a.max(b))).copied()
    }

    /// Score of `{u, v}` if the edge exists.
    pub fn score(&self, u: &N, v: &N) -> Option<f64> {
        self.edge_index(u, v).map(|k| self.edges[k].score)
    }

    /// Copy of this graph without the `blocked` edges (either orientation).
    ///
    /// Nodes are kept even if they become isolated, so `node_count` and the
    /// walk capacity derived from it do not change between rounds.
    pub fn without_edges(&self, blocked: &[(N, N)]) -> Self {
        let is_blocked = |e: &ScoredEdge<N>| {
            blocked
                .iter()
                .any(|(x, y)| (e.u == *x && e.v == *y) || (e.u == *y && e.v == *x))
        };
        let mut g = Self::default();
        for n in &self.nodes {
            g.add_node(n.clone());
        }
        for e in self.edges.iter().filter(|e| !is_blocked(e)) {
            // Source edges are already validated.
            let key = (g.index[&e.u], g.index[&e.v]);
            let key = (key.0.min(key.1), key.0.max(key.1));
            g.edge_of.insert(key, g.edges.len());
            g.adj[key.0].push(g.nodes[key.1].clone());
            g.adj[key.1].push(g.nodes[key.0].clone());
            g.edges.push(e.clone());
        }
        g
    }
}

impl<N: Clone + Eq + Hash + fmt::Debug> WalkGraph for ScoredGraph<N> {
    type Node = N;

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn neighbors(&self, node: &N) -> &[N] {
        match self.index.get(node) {
            Some(&i) => &self.adj[i],
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_follow_insertion_order() {
        let g = ScoredGraph::from_edges([
            ScoredEdge::new('a', 'b', 1.0),
            ScoredEdge::new('c', 'a', 2.0),
            ScoredEdge::new('a', 'd', 0.5),
        ])
        .unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.neighbors(&'a'), &['b', 'c', 'd']);
        assert_eq!(g.neighbors(&'c'), &['a']);
        assert!(g.neighbors(&'z').is_empty());
        assert_eq!(g.score(&'a', &'c'), Some(2.0));
        assert_eq!(g.score(&'c', &'a'), Some(2.0));
        assert_eq!(g.score(&'b', &'c'), None);
        assert_eq!(g.nodes(), &['a', 'b', 'c', 'd']);
        assert_eq!(g.index_of(&'c'), Some(2));
        assert_eq!(g.edge_index(&'d', &'a'), Some(2));
        assert!(g.contains(&'d') && !g.contains(&'z'));
    }

    #[test]
    fn rejects_self_loops_and_duplicates() {
        let err = ScoredGraph::from_edges([ScoredEdge::new(1, 1, 1.0)]).unwrap_err();
        assert!(matches!(err, GraphError::SelfLoop { .. }));
        let err = ScoredGraph::from_edges([ScoredEdge::new(1, 2, 1.0), ScoredEdge::new(2, 1, 3.0)])
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateEdge { .. }));
    }

    #[test]
    fn masking_keeps_nodes_and_drops_edges() {
        let g = ScoredGraph::from_edges([
            ScoredEdge::new(1, 2, 1.0),
            ScoredEdge::new(2, 3, 2.0),
            ScoredEdge::new(3, 1, 3.0),
        ])
        .unwrap();
        let masked = g.without_edges(&[(3, 2)]);
        assert_eq!(masked.node_count(), 3);
        assert_eq!(masked.edges().len(), 2);
        assert_eq!(masked.score(&2, &3), None);
        assert_eq!(masked.neighbors(&2), &[1]);
        // Source graph untouched.
        assert_eq!(g.score(&2, &3), Some(2.0));
    }
}
