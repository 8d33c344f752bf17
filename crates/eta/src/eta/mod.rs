//! Expansion-based Traversal Algorithm: best-first branch and bound over walks.
//!
//! Purpose
//! - Find a walk (open, or closed when allowed) maximizing the summed score of
//!   its edges, with at most `K` distinct nodes and an optional turn bound.
//!
//! Outline
//! - Seed one single-edge walk per candidate edge, each with an admissible
//!   upper bound derived from the descending candidate scores.
//! - Pop the walk with the largest bound; extend each end by its best unvisited
//!   candidate neighbor; update the incumbent; tighten the bound by replacing
//!   top-`K` slots with the scores actually added; re-queue unless dominated.
//! - Stop when the popped bound drops below the incumbent (certificate), the
//!   frontier empties, or the iteration/time budget runs out.
//!
//! Layout
//! - `types.rs` (config, state, outcome, errors) and `search.rs` (the loop).

mod search;
mod types;

pub use search::{eta_search, solve_with_defaults};
pub use types::{
    IterationLimit, SearchCfg, SearchError, SearchOutcome, SearchStats, Termination, WalkState,
};
