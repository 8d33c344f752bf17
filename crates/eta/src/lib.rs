//! Expansion-based Traversal Algorithm (ETA) and its collaborators.
//!
//! The crate searches an undirected, scored graph for the walk with the
//! largest aggregated edge score under a node-count bound and, optionally, a
//! bound on sharp direction changes.
//!
//! Layout
//! - `candidates`, `frontier`, `domination`: the three data structures the
//!   search is built from (ranked edges, max-queue, pruning memo).
//! - `eta`: the branch-and-bound loop itself.
//! - `turn`, `geo`: turn classification and the angle sources that feed it.
//! - `graph`, `project`, `rand`, `walk`: graph input, grid projection of a
//!   found walk, reproducible random graphs, walk post-processing.
//! - `network`: base network with length/cost metrics and the terminal graph
//!   the search runs on when routing through a set of destinations.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API; the
//!   curated surface lives in `api`.

pub mod api;
pub mod candidates;
pub mod domination;
pub mod eta;
pub mod frontier;
pub mod geo;
pub mod graph;
pub mod network;
pub mod project;
pub mod rand;
pub mod turn;
pub mod walk;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::candidates::{CandidateEdgeIndex, SeedLimit};
    pub use crate::eta::{
        eta_search, solve_with_defaults, IterationLimit, SearchCfg, SearchError, SearchOutcome,
        Termination,
    };
    pub use crate::geo::{PlanarCoords, SphericalCoords, TurnGeometry};
    pub use crate::graph::{ScoredEdge, ScoredGraph, WalkGraph};
    pub use crate::turn::{Turn, TurnCfg, TurnCounter};
    pub use nalgebra::Vector2 as Vec2;
}
