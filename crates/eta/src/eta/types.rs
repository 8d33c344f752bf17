//! Configuration, walk state, outcome and error types for the ETA search.
//!
//! Kept small and explicit to make `search` easy to read.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crate::candidates::SeedLimit;
use crate::frontier::{Bounded, EmptyFrontier};
use crate::turn::TurnCfg;

/// Iteration budget of the expansion loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterationLimit {
    Bounded(u64),
    Unlimited,
}

impl IterationLimit {
    /// Command-line convention: `-1` is unlimited.
    pub fn from_signed(n: i64) -> Result<Self, SearchError> {
        match n {
            -1 => Ok(IterationLimit::Unlimited),
            n if n >= 0 => Ok(IterationLimit::Bounded(n as u64)),
            n => Err(SearchError::InvalidIterationLimit { value: n }),
        }
    }

    #[inline]
    pub fn reached(self, iterations: u64) -> bool {
        match self {
            IterationLimit::Bounded(max) => iterations >= max,
            IterationLimit::Unlimited => false,
        }
    }
}

/// Search configuration.
#[derive(Clone, Copy, Debug)]
pub struct SearchCfg {
    pub seed_limit: SeedLimit,
    pub iteration_limit: IterationLimit,
    /// Turn bound; requires an angle source when set.
    pub turn: Option<TurnCfg>,
    /// Report objectives as a fraction of the best top-`K` sum instead of raw scores.
    pub normalize_objective: bool,
    /// Allow closed walks (first node == last node). Also raises `K` by one.
    pub allow_closed_walks: bool,
    /// Demand at least `K` candidates (`nodeCount (+1)`) instead of one.
    pub require_full_candidates: bool,
    /// Wall-clock budget, checked between pops.
    pub time_limit: Option<Duration>,
}

impl Default for SearchCfg {
    fn default() -> Self {
        Self {
            seed_limit: SeedLimit::default(),
            iteration_limit: IterationLimit::Bounded(1_000_000),
            turn: None,
            normalize_objective: true,
            allow_closed_walks: true,
            require_full_candidates: false,
            time_limit: None,
        }
    }
}

/// A partial walk in the frontier.
#[derive(Clone, Debug)]
pub struct WalkState<N> {
    /// Simple path; grows at both ends.
    pub nodes: VecDeque<N>,
    pub objective: f64,
    /// Admissible: never below the objective of any extension.
    pub upper_bound: f64,
    /// Rank in `demands` of the weakest top-`K` slot not yet replaced by a real edge.
    pub cursor: usize,
    /// Running turn count (stays 0 without a turn bound).
    pub turns: u32,
}

impl<N: PartialEq> WalkState<N> {
    #[inline]
    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<N> Bounded for WalkState<N> {
    fn upper_bound(&self) -> f64 {
        self.upper_bound
    }
}

/// Why the expansion loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Every state was expanded or pruned.
    FrontierExhausted,
    /// The best remaining bound fell below the incumbent: the result is optimal
    /// over the explored expansion space.
    BoundCertified,
    IterationLimit,
    TimeLimit,
}

impl Termination {
    pub fn is_budget_cutoff(self) -> bool {
        matches!(self, Termination::IterationLimit | Termination::TimeLimit)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::FrontierExhausted => "frontier_exhausted",
            Termination::BoundCertified => "bound_certified",
            Termination::IterationLimit => "iteration_limit",
            Termination::TimeLimit => "time_limit",
        };
        f.write_str(s)
    }
}

/// Counters collected during one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Popped states that passed the termination checks.
    pub iterations: u64,
    /// States pushed, seeds included.
    pub pushed: u64,
    pub dead_ends: u64,
    /// Re-insertions rejected by the domination table.
    pub dominated: u64,
    /// Extensions dropped for exceeding the turn bound.
    pub infeasible: u64,
    /// Closed walks evaluated.
    pub closures: u64,
    /// Strict improvements of the incumbent.
    pub improvements: u64,
    pub max_frontier: usize,
}

/// Best walk found and how the search ended.
#[derive(Clone, Debug)]
pub struct SearchOutcome<N> {
    /// Node sequence; when `closed`, the first node is repeated at the end.
    pub walk: Vec<N>,
    /// Normalized or raw, per `SearchCfg::normalize_objective`.
    pub objective: f64,
    pub closed: bool,
    pub termination: Termination,
    pub stats: SearchStats,
    /// Divisor applied to scores (`1.0` in raw mode or when all scores are zero).
    pub scale: f64,
    /// Walk capacity `K` used by the search.
    pub capacity: usize,
    /// Incumbent objective after each strict improvement, in order. The
    /// initial best edge is not listed.
    pub incumbents: Vec<f64>,
}

impl<N> SearchOutcome<N> {
    /// Objective in the input score units.
    pub fn raw_objective(&self) -> f64 {
        self.objective * self.scale
    }

    /// Number of distinct nodes on the walk.
    pub fn distinct_nodes(&self) -> usize {
        if self.closed {
            self.walk.len().saturating_sub(1)
        } else {
            self.walk.len()
        }
    }
}

/// Errors surfaced before the search loop starts (configuration) or, for
/// `EmptyFrontier`, by a broken loop invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    InvalidSeedLimit { value: i64 },
    InvalidIterationLimit { value: i64 },
    EmptyGraph,
    NegativeScore { edge: String, score: f64 },
    NonFiniteScore { edge: String },
    SelfLoop { node: String },
    DuplicateEdge { edge: String },
    InsufficientCandidates { found: usize, required: usize },
    /// A turn bound was configured without an angle source.
    MissingGeometry,
    /// The angle source has no position for a candidate-edge endpoint.
    UncoveredNode { node: String },
    EmptyFrontier,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::InvalidSeedLimit { value } => {
                write!(f, "invalid seed limit {value} (use a positive count or -1)")
            }
            SearchError::InvalidIterationLimit { value } => {
                write!(f, "invalid iteration limit {value} (use a count >= 0 or -1)")
            }
            SearchError::EmptyGraph => write!(f, "graph has no nodes"),
            SearchError::NegativeScore { edge, score } => {
                write!(f, "edge {edge} has negative score {score}")
            }
            SearchError::NonFiniteScore { edge } => write!(f, "edge {edge} has a non-finite score"),
            SearchError::SelfLoop { node } => write!(f, "self-loop on node {node}"),
            SearchError::DuplicateEdge { edge } => write!(f, "edge {edge} listed twice"),
            SearchError::InsufficientCandidates { found, required } => write!(
                f,
                "need at least {required} candidate edge(s) to seed a walk, found {found}"
            ),
            SearchError::MissingGeometry => {
                write!(f, "turn limit configured but no angle source given")
            }
            SearchError::UncoveredNode { node } => {
                write!(f, "angle source has no position for node {node}")
            }
            SearchError::EmptyFrontier => write!(f, "pop from an empty frontier"),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<EmptyFrontier> for SearchError {
    fn from(_: EmptyFrontier) -> Self {
        SearchError::EmptyFrontier
    }
}
