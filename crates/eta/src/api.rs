//! Curated internal API (UNSTABLE).
//!
//! Important
//! - This is not a public API. It is a convenience surface for the CLI,
//!   benches and experiments. Breaking changes are allowed and expected.

// Search
pub use crate::eta::{
    eta_search, solve_with_defaults, IterationLimit, SearchCfg, SearchError, SearchOutcome,
    SearchStats, Termination,
};
// Building blocks
pub use crate::candidates::{CandidateEdgeIndex, SeedLimit};
pub use crate::domination::{DominationTable, PairKey};
pub use crate::frontier::{EmptyFrontier, PriorityFrontier};
// Graph input and turn geometry
pub use crate::geo::{haversine, planar_angle, spherical_angle, PlanarCoords, SphericalCoords};
pub use crate::graph::{GraphError, ScoredEdge, ScoredGraph, WalkGraph};
pub use crate::network::{
    transformed_graph, EdgeMetrics, MetricNetwork, NetworkError, TransformedGraph, WalkTotals,
};
pub use crate::turn::{Turn, TurnCfg, TurnCounter};
// Collaborators
pub use crate::project::{Cell, GridCfg, GridProjector, GridWorld, PathProjector, Projection};
pub use crate::rand::{random_geometric_graph, RandomGraph, RandomGraphCfg};
pub use crate::walk::{rotate_to_source, walk_edges, walk_score};
