//! Best-first branch and bound growing walks from both ends.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, trace};

use crate::candidates::CandidateEdgeIndex;
use crate::domination::{DominationTable, PairKey};
use crate::frontier::PriorityFrontier;
use crate::geo::TurnGeometry;
use crate::graph::{ScoredEdge, ScoredGraph, WalkGraph};
use crate::turn::TurnCounter;

use super::types::{SearchCfg, SearchError, SearchOutcome, SearchStats, Termination, WalkState};

/// Relative slack for the admissibility assertion (float sums).
const BOUND_EPS: f64 = 1e-9;

/// Run ETA on `graph` with candidate scores taken from `edges`.
///
/// `geometry` is required when `cfg.turn` is set and ignored otherwise.
/// Always returns some walk (at worst the best single edge) once the
/// configuration is valid.
pub fn eta_search<G>(
    graph: &G,
    edges: &[ScoredEdge<G::Node>],
    cfg: SearchCfg,
    geometry: Option<&dyn TurnGeometry<G::Node>>,
) -> Result<SearchOutcome<G::Node>, SearchError>
where
    G: WalkGraph,
{
    EtaRunner::new(graph, edges, cfg, geometry)?.run()
}

/// Convenience: scores attached to the graph, default configuration, no turn bound.
pub fn solve_with_defaults<N>(graph: &ScoredGraph<N>) -> Result<SearchOutcome<N>, SearchError>
where
    N: Clone + Eq + std::hash::Hash + std::fmt::Debug,
{
    eta_search(graph, graph.edges(), SearchCfg::default(), None)
}

/// A chosen neighbor for one end of the walk.
#[derive(Clone, Debug)]
struct Pick<N> {
    node: N,
    score: f64,
}

/// What one expansion step does with the popped walk.
enum Step<N> {
    DeadEnd,
    /// Both ends meet at `node`: the walk closes into a cycle through it.
    Closure {
        node: N,
        front: f64,
        back: f64,
    },
    Extend {
        front: Option<Pick<N>>,
        back: Option<Pick<N>>,
    },
}

/// Runner carrying the search context and accumulators.
struct EtaRunner<'a, G: WalkGraph> {
    g: &'a G,
    cfg: SearchCfg,
    ld: CandidateEdgeIndex<G::Node>,
    turns: Option<(TurnCounter, &'a dyn TurnGeometry<G::Node>)>,
    /// Walk capacity.
    k: usize,
    /// Sum of the top-`k` (possibly normalized) scores.
    dmax: f64,
    scale: f64,
    best: f64,
    best_walk: Vec<G::Node>,
    best_closed: bool,
    incumbents: Vec<f64>,
    frontier: PriorityFrontier<WalkState<G::Node>>,
    table: DominationTable<G::Node>,
    stats: SearchStats,
}

impl<'a, G: WalkGraph> EtaRunner<'a, G> {
    fn new(
        g: &'a G,
        edges: &[ScoredEdge<G::Node>],
        cfg: SearchCfg,
        geometry: Option<&'a dyn TurnGeometry<G::Node>>,
    ) -> Result<Self, SearchError> {
        if g.node_count() == 0 {
            return Err(SearchError::EmptyGraph);
        }
        let turns = match (cfg.turn, geometry) {
            (None, _) => None,
            (Some(_), None) => return Err(SearchError::MissingGeometry),
            (Some(tc), Some(geo)) => Some((TurnCounter::new(tc), geo)),
        };

        let mut ld = CandidateEdgeIndex::build(edges, cfg.seed_limit)?;
        let max_walk_nodes = g.node_count() + usize::from(cfg.allow_closed_walks);
        if cfg.require_full_candidates {
            ld.require(max_walk_nodes)?;
        }
        if let Some((_, geo)) = turns {
            for ((u, v), _) in ld.iter() {
                for n in [u, v] {
                    if !geo.covers(n) {
                        return Err(SearchError::UncoveredNode {
                            node: format!("{n:?}"),
                        });
                    }
                }
            }
        }

        let k = ld.len().min(max_walk_nodes);
        let scale = if cfg.normalize_objective {
            ld.normalize(k)
        } else {
            1.0
        };
        let dmax = ld.prefix_sum(k);
        let (u, v) = ld.edge(0).clone();
        let best = ld.demand(0);

        Ok(Self {
            g,
            cfg,
            ld,
            turns,
            k,
            dmax,
            scale,
            best,
            best_walk: vec![u, v],
            best_closed: false,
            incumbents: Vec::new(),
            frontier: PriorityFrontier::with_capacity(edges.len()),
            table: DominationTable::new(),
            stats: SearchStats::default(),
        })
    }

    fn run(mut self) -> Result<SearchOutcome<G::Node>, SearchError> {
        debug!(
            nodes = self.g.node_count(),
            candidates = self.ld.len(),
            k = self.k,
            dmax = self.dmax,
            scale = self.scale,
            turn_limit = ?self.turns.map(|(tc, _)| tc.limit()),
            "eta: start"
        );
        self.seed();

        let started = Instant::now();
        let termination = loop {
            if self.frontier.is_empty() {
                break Termination::FrontierExhausted;
            }
            if let Some(budget) = self.cfg.time_limit {
                if started.elapsed() >= budget {
                    break Termination::TimeLimit;
                }
            }
            let state = self.frontier.pop()?;
            if state.upper_bound < self.best {
                break Termination::BoundCertified;
            }
            if self.cfg.iteration_limit.reached(self.stats.iterations) {
                break Termination::IterationLimit;
            }
            self.stats.iterations += 1;
            self.expand(state);
        };

        debug!(
            %termination,
            objective = self.best,
            walk_len = self.best_walk.len(),
            iterations = self.stats.iterations,
            pushed = self.stats.pushed,
            dominated = self.stats.dominated,
            dead_ends = self.stats.dead_ends,
            "eta: done"
        );
        Ok(SearchOutcome {
            walk: self.best_walk,
            objective: self.best,
            closed: self.best_closed,
            termination,
            stats: self.stats,
            scale: self.scale,
            capacity: self.k,
            incumbents: self.incumbents,
        })
    }

    /// One single-edge walk per candidate.
    ///
    /// The top-`k` edges may all end up in the final walk, so their bound is
    /// `dmax`. A lower-ranked edge can only enter by displacing the weakest of
    /// the top-`k`, which tightens its bound and consumes one slot.
    fn seed(&mut self) {
        let k = self.k;
        for rank in 0..self.ld.len() {
            let (u, v) = self.ld.edge(rank).clone();
            let score = self.ld.demand(rank);
            let (cursor, upper_bound) = if rank < k {
                (k - 1, self.dmax)
            } else {
                (k.saturating_sub(2), self.dmax - self.ld.demand(k - 1) + score)
            };
            self.push(WalkState {
                nodes: VecDeque::from([u, v]),
                objective: score,
                upper_bound,
                cursor,
                turns: 0,
            });
        }
    }

    fn push(&mut self, state: WalkState<G::Node>) {
        debug_assert!(
            state.upper_bound + BOUND_EPS * state.upper_bound.abs().max(1.0) >= state.objective,
            "inadmissible bound {} < objective {} for {:?}",
            state.upper_bound,
            state.objective,
            state.nodes
        );
        trace!(ub = state.upper_bound, objective = state.objective, len = state.len(), "push");
        self.frontier.push(state);
        self.stats.pushed += 1;
        self.stats.max_frontier = self.stats.max_frontier.max(self.frontier.len());
    }

    fn expand(&mut self, state: WalkState<G::Node>) {
        let (Some(front), Some(back)) = (state.nodes.front(), state.nodes.back()) else {
            return;
        };
        let front = self.best_two(front, &state);
        let back = self.best_two(back, &state);
        match self.resolve(state.len(), front, back) {
            Step::DeadEnd => self.stats.dead_ends += 1,
            Step::Closure { node, front, back } => self.close_through(state, node, front + back),
            Step::Extend { front, back } => self.extend(state, front, back),
        }
    }

    /// Best and runner-up candidate neighbors of `end` outside the walk.
    ///
    /// Strict `>` comparisons: among equal scores the first neighbor seen wins.
    fn best_two(
        &self,
        end: &G::Node,
        state: &WalkState<G::Node>,
    ) -> (Option<Pick<G::Node>>, Option<Pick<G::Node>>) {
        let mut best: Option<Pick<G::Node>> = None;
        let mut second: Option<Pick<G::Node>> = None;
        for v in self.g.neighbors(end) {
            let Some(score) = self.ld.score_of(end, v) else {
                continue;
            };
            if state.contains(v) {
                continue;
            }
            if best.as_ref().map_or(true, |b| score > b.score) {
                second = best.take();
                best = Some(Pick {
                    node: v.clone(),
                    score,
                });
            } else if best.as_ref().is_some_and(|b| b.node != *v)
                && second.as_ref().map_or(true, |s| score > s.score)
            {
                second = Some(Pick {
                    node: v.clone(),
                    score,
                });
            }
        }
        (best, second)
    }

    fn resolve(
        &self,
        len: usize,
        (f1, f2): (Option<Pick<G::Node>>, Option<Pick<G::Node>>),
        (b1, b2): (Option<Pick<G::Node>>, Option<Pick<G::Node>>),
    ) -> Step<G::Node> {
        match (f1, b1) {
            (None, None) => Step::DeadEnd,
            (Some(f), Some(b)) if f.node == b.node => {
                if self.cfg.allow_closed_walks && len + 2 >= self.k {
                    return Step::Closure {
                        node: f.node,
                        front: f.score,
                        back: b.score,
                    };
                }
                // Keep growing in two directions: both ends fall back to their runner-up.
                let (front, back) = match (f2, b2) {
                    (Some(x), Some(y)) if x.node == y.node => {
                        if y.score > x.score {
                            (None, Some(y))
                        } else {
                            (Some(x), None)
                        }
                    }
                    other => other,
                };
                if front.is_none() && back.is_none() {
                    Step::DeadEnd
                } else {
                    Step::Extend { front, back }
                }
            }
            (front, back) => Step::Extend { front, back },
        }
    }

    fn extend(
        &mut self,
        mut next: WalkState<G::Node>,
        front: Option<Pick<G::Node>>,
        back: Option<Pick<G::Node>>,
    ) {
        let popped_bound = next.upper_bound;
        if let Some(p) = &front {
            next.nodes.push_front(p.node.clone());
            next.objective += p.score;
        }
        if let Some(p) = &back {
            next.nodes.push_back(p.node.clone());
            next.objective += p.score;
        }

        if let Some((tc, geo)) = self.turns {
            let n = next.len();
            if n >= 3 {
                let w = &next.nodes;
                if front.is_some() {
                    next.turns = tc.observe(geo, &w[0], &w[1], &w[2], next.turns);
                }
                if back.is_some() {
                    next.turns = tc.observe(geo, &w[n - 3], &w[n - 2], &w[n - 1], next.turns);
                }
            }
            if !tc.is_feasible(next.turns) {
                self.stats.infeasible += 1;
                return;
            }
        }

        self.offer(&next.nodes, next.objective, false);
        self.close_endpoints(&next);

        let expandable = self.turns.map_or(true, |(tc, _)| tc.can_expand(next.turns));
        if !expandable || popped_bound <= self.best || next.len() >= self.k {
            return;
        }

        let mut added: Vec<f64> = front.iter().chain(back.iter()).map(|p| p.score).collect();
        // Smaller first: checking the larger score first can leave it above a
        // slot that the smaller one then frees, overstating the bound.
        added.sort_by(f64::total_cmp);
        let Some((upper_bound, cursor)) = self.tighten(popped_bound, next.cursor, &added) else {
            return;
        };
        next.upper_bound = upper_bound;
        next.cursor = cursor;

        let key = PairKey::new(front.map(|p| p.node), back.map(|p| p.node));
        if key.is_degenerate() {
            return;
        }
        if !self.table.improve(key, next.objective) {
            self.stats.dominated += 1;
            return;
        }
        self.push(next);
    }

    /// Replace top-`k` slots with the real scores of the added edges.
    ///
    /// Returns `None` once every slot is consumed (the walk cannot grow further).
    fn tighten(&self, mut ub: f64, cursor: usize, added: &[f64]) -> Option<(f64, usize)> {
        let mut cur = Some(cursor);
        for &score in added {
            let c = cur?;
            let slot = self.ld.demand(c);
            if score < slot {
                ub -= slot - score;
                cur = c.checked_sub(1);
            }
        }
        cur.map(|c| (ub, c))
    }

    /// Both ends picked the same node: close the cycle `[v, ..walk.., v]`.
    fn close_through(&mut self, state: WalkState<G::Node>, v: G::Node, gain: f64) {
        self.stats.closures += 1;
        let mut turns = state.turns;
        let mut nodes = state.nodes;
        nodes.push_front(v);
        if let Some((tc, geo)) = self.turns {
            turns = cycle_turns(&tc, geo, &nodes, &[0, 1, nodes.len() - 1], turns);
            if !tc.is_feasible(turns) {
                self.stats.infeasible += 1;
                return;
            }
        }
        self.offer(&nodes, state.objective + gain, true);
    }

    /// Evaluate the closed walk obtained by joining the two endpoints, if they
    /// share a candidate edge. Closed walks are terminal and never queued.
    fn close_endpoints(&mut self, open: &WalkState<G::Node>) {
        if !self.cfg.allow_closed_walks || open.len() < 3 {
            return;
        }
        let (Some(front), Some(back)) = (open.nodes.front(), open.nodes.back()) else {
            return;
        };
        let Some(score) = self.ld.score_of(back, front) else {
            return;
        };
        self.stats.closures += 1;
        let mut turns = open.turns;
        if let Some((tc, geo)) = self.turns {
            let n = open.len();
            turns = cycle_turns(&tc, geo, &open.nodes, &[0, n - 1], turns);
            if !tc.is_feasible(turns) {
                self.stats.infeasible += 1;
                return;
            }
        }
        self.offer(&open.nodes, open.objective + score, true);
    }

    /// Update the incumbent on strict improvement. `closed` repeats the first node at the end.
    fn offer(&mut self, nodes: &VecDeque<G::Node>, objective: f64, closed: bool) {
        if objective <= self.best {
            return;
        }
        self.best = objective;
        self.best_walk = nodes.iter().cloned().collect();
        if closed {
            if let Some(first) = nodes.front() {
                self.best_walk.push(first.clone());
            }
        }
        self.best_closed = closed;
        self.incumbents.push(objective);
        self.stats.improvements += 1;
        debug!(
            objective,
            len = self.best_walk.len(),
            closed,
            iteration = self.stats.iterations,
            "eta: new best"
        );
    }
}

/// Fold the turns at cycle positions `at` (indices into the open node list,
/// neighbors taken cyclically) into `count`.
fn cycle_turns<N, G>(tc: &TurnCounter, geo: &G, nodes: &VecDeque<N>, at: &[usize], count: u32) -> u32
where
    G: TurnGeometry<N> + ?Sized,
{
    let n = nodes.len();
    at.iter().fold(count, |acc, &i| {
        let prev = &nodes[(i + n - 1) % n];
        let next = &nodes[(i + 1) % n];
        tc.observe(geo, prev, &nodes[i], next, acc)
    })
}
