//! Reproducible random geometric graphs for experiments, benches and tests.
//!
//! Model
//! - `nodes` points uniform in the unit square; every pair closer than `radius`
//!   becomes an edge with a score drawn uniformly from `[score_min, score_max)`.
//! - The same `(cfg, seed)` always yields the same graph, node order and edge order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::PlanarCoords;
use crate::graph::{ScoredEdge, ScoredGraph};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomGraphCfg {
    pub nodes: usize,
    pub radius: f64,
    pub score_min: f64,
    pub score_max: f64,
}

impl Default for RandomGraphCfg {
    fn default() -> Self {
        Self {
            nodes: 30,
            radius: 0.3,
            score_min: 0.0,
            score_max: 10.0,
        }
    }
}

/// A sampled graph plus the positions its edges were derived from.
#[derive(Clone, Debug)]
pub struct RandomGraph {
    pub graph: ScoredGraph<usize>,
    pub coords: PlanarCoords<usize>,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorError {
    InvalidParams { reason: String },
}

impl std::fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorError::InvalidParams { reason } => {
                write!(f, "invalid generator params: {reason}")
            }
        }
    }
}

impl std::error::Error for GeneratorError {}

impl RandomGraphCfg {
    fn validate(&self) -> Result<(), GeneratorError> {
        let invalid = |reason: &str| {
            Err(GeneratorError::InvalidParams {
                reason: reason.to_string(),
            })
        };
        if self.nodes < 2 {
            return invalid("need at least two nodes");
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return invalid("radius must be finite and > 0");
        }
        if !(self.score_min.is_finite() && self.score_max.is_finite()) {
            return invalid("score bounds must be finite");
        }
        if self.score_min < 0.0 || self.score_min >= self.score_max {
            return invalid("need 0 <= score_min < score_max");
        }
        Ok(())
    }
}

/// Sample a random geometric graph; nodes are `0..cfg.nodes`.
pub fn random_geometric_graph(cfg: RandomGraphCfg, seed: u64) -> Result<RandomGraph, GeneratorError> {
    cfg.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let points: Vec<(f64, f64)> = (0..cfg.nodes).map(|_| (rng.gen(), rng.gen())).collect();

    let mut edges = Vec::new();
    for i in 0..cfg.nodes {
        for j in (i + 1)..cfg.nodes {
            let (dx, dy) = (points[i].0 - points[j].0, points[i].1 - points[j].1);
            if dx.hypot(dy) < cfg.radius {
                let score = rng.gen_range(cfg.score_min..cfg.score_max);
                edges.push(ScoredEdge::new(i, j, score));
            }
        }
    }
    let graph = ScoredGraph::with_nodes(0..cfg.nodes, edges).map_err(|e| {
        GeneratorError::InvalidParams {
            reason: e.to_string(),
        }
    })?;
    let coords = points
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| (i, x, y))
        .collect();
    Ok(RandomGraph {
        graph,
        coords,
        points,
    })
}
