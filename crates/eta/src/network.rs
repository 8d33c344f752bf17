//! Base network with physical edge metrics and the terminal graph derived from it.
//!
//! - `MetricNetwork`: undirected network whose edges carry a travel `length`
//!   and a redirection `cost`. Edge weights mix both as
//!   `alpha * length + (1 - alpha) * cost`.
//! - `transformed_graph`: complete graph over the terminals (source first, then
//!   destinations). Each terminal pair becomes one edge scored with the weight
//!   of the cheapest base path between them; the path is kept so a walk found
//!   on the terminal graph expands back onto the base network. Pairs with no
//!   connecting path get no edge.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::graph::{GraphError, ScoredEdge, ScoredGraph, WalkGraph};

/// Physical attributes of one base-network edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeMetrics {
    pub length: f64,
    pub cost: f64,
}

impl EdgeMetrics {
    pub fn new(length: f64, cost: f64) -> Self {
        Self { length, cost }
    }

    #[inline]
    pub fn weight(&self, alpha: f64) -> f64 {
        alpha * self.length + (1.0 - alpha) * self.cost
    }
}

/// Summed metrics along a walk.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WalkTotals {
    pub length: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    Graph(GraphError),
    /// Length or cost is negative or not finite.
    InvalidMetric { edge: String },
    /// `alpha` must lie in `[0, 1]`.
    InvalidAlpha { alpha: f64 },
    UnknownTerminal { node: String },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Graph(e) => write!(f, "{e}"),
            NetworkError::InvalidMetric { edge } => {
                write!(f, "edge {edge} needs finite, non-negative length and cost")
            }
            NetworkError::InvalidAlpha { alpha } => write!(f, "alpha {alpha} is outside [0, 1]"),
            NetworkError::UnknownTerminal { node } => {
                write!(f, "terminal {node} is not in the network")
            }
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<GraphError> for NetworkError {
    fn from(e: GraphError) -> Self {
        NetworkError::Graph(e)
    }
}

/// Base network; `metrics[k]` belongs to `graph.edges()[k]`.
#[derive(Clone, Debug)]
pub struct MetricNetwork<N> {
    graph: ScoredGraph<N>,
    metrics: Vec<EdgeMetrics>,
}

impl<N: Clone + Eq + Hash + fmt::Debug> MetricNetwork<N> {
    pub fn from_edges<I>(edges: I) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = (N, N, EdgeMetrics)>,
    {
        let mut graph = ScoredGraph::default();
        let mut metrics = Vec::new();
        for (u, v, m) in edges {
            let ok = |x: f64| x.is_finite() && x >= 0.0;
            if !(ok(m.length) && ok(m.cost)) {
                return Err(NetworkError::InvalidMetric {
                    edge: format!("{{{u:?}, {v:?}}}"),
                });
            }
            graph.add_edge(ScoredEdge::new(u, v, m.length))?;
            metrics.push(m);
        }
        Ok(Self { graph, metrics })
    }

    pub fn graph(&self) -> &ScoredGraph<N> {
        &self.graph
    }

    pub fn metrics(&self, u: &N, v: &N) -> Option<EdgeMetrics> {
        self.graph.edge_index(u, v).map(|k| self.metrics[k])
    }

    /// Length and cost along `walk`; `None` if it leaves the network.
    pub fn totals(&self, walk: &[N]) -> Option<WalkTotals> {
        walk.windows(2).try_fold(WalkTotals::default(), |acc, w| {
            let m = self.metrics(&w[0], &w[1])?;
            Some(WalkTotals {
                length: acc.length + m.length,
                cost: acc.cost + m.cost,
            })
        })
    }

    /// Cheapest path by `alpha`-weight and its weight.
    pub fn shortest_path(&self, from: &N, to: &N, alpha: f64) -> Option<(Vec<N>, f64)> {
        let src = self.graph.index_of(from)?;
        let dst = self.graph.index_of(to)?;
        let (dist, prev) = self.dijkstra(src, alpha);
        self.trace(&dist, &prev, src, dst)
    }

    /// Single-source Dijkstra over dense indices.
    fn dijkstra(&self, src: usize, alpha: f64) -> (Vec<f64>, Vec<Option<usize>>) {
        let nodes = self.graph.nodes();
        let mut dist = vec![f64::INFINITY; nodes.len()];
        let mut prev = vec![None; nodes.len()];
        dist[src] = 0.0;
        let mut heap = BinaryHeap::from([Visit { cost: 0.0, at: src }]);
        while let Some(Visit { cost, at }) = heap.pop() {
            if cost > dist[at] {
                continue;
            }
            for n in self.graph.neighbors(&nodes[at]) {
                let Some(k) = self.graph.edge_index(&nodes[at], n) else {
                    continue;
                };
                let Some(j) = self.graph.index_of(n) else {
                    continue;
                };
                let next = cost + self.metrics[k].weight(alpha);
                if next < dist[j] {
                    dist[j] = next;
                    prev[j] = Some(at);
                    heap.push(Visit { cost: next, at: j });
                }
            }
        }
        (dist, prev)
    }

    fn trace(
        &self,
        dist: &[f64],
        prev: &[Option<usize>],
        src: usize,
        dst: usize,
    ) -> Option<(Vec<N>, f64)> {
        if !dist[dst].is_finite() {
            return None;
        }
        let nodes = self.graph.nodes();
        let mut path = vec![nodes[dst].clone()];
        let mut cur = dst;
        while cur != src {
            cur = prev[cur]?;
            path.push(nodes[cur].clone());
        }
        path.reverse();
        Some((path, dist[dst]))
    }
}

/// Dijkstra queue entry, min-cost first, lower index on ties.
struct Visit {
    cost: f64,
    at: usize,
}

impl PartialEq for Visit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Visit {}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.at.cmp(&self.at))
    }
}

/// Terminal graph plus the base sub-path behind each of its edges.
#[derive(Clone, Debug)]
pub struct TransformedGraph<N> {
    graph: ScoredGraph<N>,
    /// `paths[k]` runs from `graph.edges()[k].u` to `.v`.
    paths: Vec<Vec<N>>,
    terminals: Vec<N>,
}

impl<N: Clone + Eq + Hash + fmt::Debug> TransformedGraph<N> {
    pub fn graph(&self) -> &ScoredGraph<N> {
        &self.graph
    }

    /// Source first, then destinations in input order (duplicates dropped).
    pub fn terminals(&self) -> &[N] {
        &self.terminals
    }

    /// Base path behind terminal edge `{u, v}`, oriented `u → v`.
    pub fn sub_path(&self, u: &N, v: &N) -> Option<Vec<N>> {
        let k = self.graph.edge_index(u, v)?;
        let mut p = self.paths[k].clone();
        if self.graph.edges()[k].u != *u {
            p.reverse();
        }
        Some(p)
    }

    /// Replace every terminal edge of `walk` by its base sub-path.
    pub fn expand(&self, walk: &[N]) -> Option<Vec<N>> {
        let mut out: Vec<N> = walk.first().cloned().into_iter().collect();
        for w in walk.windows(2) {
            let leg = self.sub_path(&w[0], &w[1])?;
            out.extend(leg.into_iter().skip(1));
        }
        Some(out)
    }

    /// Terminals the walk does not visit, in terminal order.
    pub fn missing_terminals(&self, walk: &[N]) -> Vec<N> {
        let seen: HashSet<&N> = walk.iter().collect();
        self.terminals
            .iter()
            .filter(|t| !seen.contains(t))
            .cloned()
            .collect()
    }
}

/// Build the terminal graph of `net` for `source` and `destinations`.
pub fn transformed_graph<N>(
    net: &MetricNetwork<N>,
    source: &N,
    destinations: &[N],
    alpha: f64,
) -> Result<TransformedGraph<N>, NetworkError>
where
    N: Clone + Eq + Hash + fmt::Debug,
{
    if !(0.0..=1.0).contains(&alpha) {
        return Err(NetworkError::InvalidAlpha { alpha });
    }
    let mut terminals: Vec<N> = Vec::with_capacity(destinations.len() + 1);
    for t in std::iter::once(source).chain(destinations) {
        if !net.graph().contains(t) {
            return Err(NetworkError::UnknownTerminal {
                node: format!("{t:?}"),
            });
        }
        if !terminals.contains(t) {
            terminals.push(t.clone());
        }
    }

    let mut graph = ScoredGraph::with_nodes(terminals.iter().cloned(), [])?;
    let mut paths = Vec::new();
    for (i, u) in terminals.iter().enumerate() {
        let Some(src) = net.graph().index_of(u) else {
            continue;
        };
        let (dist, prev) = net.dijkstra(src, alpha);
        for v in &terminals[i + 1..] {
            let Some(dst) = net.graph().index_of(v) else {
                continue;
            };
            if let Some((path, weight)) = net.trace(&dist, &prev, src, dst) {
                graph.add_edge(ScoredEdge::new(u.clone(), v.clone(), weight))?;
                paths.push(path);
            }
        }
    }
    tracing::debug!(
        terminals = terminals.len(),
        edges = graph.edges().len(),
        alpha,
        "terminal graph built"
    );
    Ok(TransformedGraph {
        graph,
        paths,
        terminals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct S-D is short but expensive; the detour via M is long but free.
    fn detour() -> MetricNetwork<&'static str> {
        MetricNetwork::from_edges([
            ("S", "D", EdgeMetrics::new(1.0, 10.0)),
            ("S", "M", EdgeMetrics::new(2.0, 0.0)),
            ("M", "D", EdgeMetrics::new(2.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn alpha_trades_length_against_cost() {
        let net = detour();
        let (p, w) = net.shortest_path(&"S", &"D", 1.0).unwrap();
        assert_eq!((p, w), (vec!["S", "D"], 1.0));
        let (p, w) = net.shortest_path(&"S", &"D", 0.0).unwrap();
        assert_eq!((p, w), (vec!["S", "M", "D"], 0.0));
        let (p, w) = net.shortest_path(&"S", &"D", 0.5).unwrap();
        assert_eq!(p, vec!["S", "M", "D"]);
        assert!((w - 2.0).abs() < 1e-12);
    }

    #[test]
    fn terminal_graph_keeps_sub_paths() {
        let net = detour();
        let tf = transformed_graph(&net, &"S", &["D", "S"], 0.5).unwrap();
        assert_eq!(tf.terminals(), &["S", "D"]);
        assert_eq!(tf.graph().node_count(), 2);
        assert_eq!(tf.graph().edges().len(), 1);
        assert!((tf.graph().score(&"D", &"S").unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(tf.sub_path(&"S", &"D").unwrap(), vec!["S", "M", "D"]);
        assert_eq!(tf.sub_path(&"D", &"S").unwrap(), vec!["D", "M", "S"]);
        let base = tf.expand(&["S", "D", "S"]).unwrap();
        assert_eq!(base, vec!["S", "M", "D", "M", "S"]);
        assert_eq!(
            net.totals(&base),
            Some(WalkTotals {
                length: 8.0,
                cost: 0.0
            })
        );
    }

    #[test]
    fn disconnected_terminals_get_no_edge() {
        let net = MetricNetwork::from_edges([
            ("S", "A", EdgeMetrics::new(1.0, 1.0)),
            ("B", "C", EdgeMetrics::new(1.0, 1.0)),
        ])
        .unwrap();
        let tf = transformed_graph(&net, &"S", &["A", "B"], 1.0).unwrap();
        assert_eq!(tf.graph().node_count(), 3);
        assert_eq!(tf.graph().edges().len(), 1);
        assert!(tf.sub_path(&"S", &"B").is_none());
        assert!(tf.expand(&["A", "S", "B"]).is_none());
        assert_eq!(tf.missing_terminals(&["S", "A"]), vec!["B"]);
        assert!(tf.missing_terminals(&["B", "A", "S"]).is_empty());
    }

    #[test]
    fn rejects_bad_inputs() {
        let net = detour();
        assert!(matches!(
            transformed_graph(&net, &"S", &["X"], 1.0),
            Err(NetworkError::UnknownTerminal { .. })
        ));
        assert!(matches!(
            transformed_graph(&net, &"S", &["D"], 1.5),
            Err(NetworkError::InvalidAlpha { .. })
        ));
        let bad = MetricNetwork::from_edges([("a", "b", EdgeMetrics::new(-1.0, 0.0))]);
        assert!(matches!(bad, Err(NetworkError::InvalidMetric { .. })));
        assert_eq!(net.totals(&["S", "X"]), None);
    }
}
