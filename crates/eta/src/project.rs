//! Projection of a found walk onto a physical grid world.
//!
//! - `PathProjector`: "given waypoints in one space, return the corresponding
//!   walk in a second graph with its cost".
//! - `GridWorld`: free cells of an `length × width` grid minus obstacles; a cell
//!   sees every free cell along the 8 compass rays up to the first obstacle or
//!   the border (queen moves).
//! - `GridProjector`: maps nodes to cells and joins consecutive waypoints with
//!   a Euclidean-cost Dijkstra path (plain, static costs).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use nalgebra::Vector2;

/// Integer grid cell `(x, y)`.
pub type Cell = (i64, i64);

const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// A projected path and its accumulated cost.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection<P> {
    pub path: Vec<P>,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The waypoint has no physical position.
    Unmapped { node: String },
    /// The waypoint maps to an obstacle or outside the world.
    Blocked { cell: Cell },
    Unreachable { from: Cell, to: Cell },
    Malformed { line: usize, reason: String },
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::Unmapped { node } => write!(f, "node {node} has no physical position"),
            ProjectionError::Blocked { cell } => {
                write!(f, "cell {cell:?} is an obstacle or outside the world")
            }
            ProjectionError::Unreachable { from, to } => {
                write!(f, "no physical path from {from:?} to {to:?}")
            }
            ProjectionError::Malformed { line, reason } => {
                write!(f, "world file line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for ProjectionError {}

/// Maps a waypoint sequence into a second space.
pub trait PathProjector<N> {
    type Point;

    fn project(&self, waypoints: &[N]) -> Result<Projection<Self::Point>, ProjectionError>;
}

/// Rectangular grid with obstacles.
#[derive(Clone, Debug, PartialEq)]
pub struct GridWorld {
    pub length: i64,
    pub width: i64,
    pub obstacles: HashSet<Cell>,
}

impl GridWorld {
    pub fn new(length: i64, width: i64, obstacles: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            length,
            width,
            obstacles: obstacles.into_iter().collect(),
        }
    }

    /// Parse the text format: an `obs` header followed by `x y` lines, a `pois`
    /// header, then `length` / `width` headers each followed by an integer.
    pub fn parse(text: &str) -> Result<Self, ProjectionError> {
        let bad = |line: usize, reason: &str| ProjectionError::Malformed {
            line: line + 1,
            reason: reason.to_string(),
        };
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        if lines.first() != Some(&"obs") {
            return Err(bad(0, "expected `obs` header"));
        }
        let mut obstacles = HashSet::new();
        let mut i = 1;
        while i < lines.len() && lines[i] != "pois" {
            let mut it = lines[i].split_whitespace().map(str::parse::<i64>);
            match (it.next(), it.next(), it.next()) {
                (Some(Ok(x)), Some(Ok(y)), None) => {
                    obstacles.insert((x, y));
                }
                _ => return Err(bad(i, "expected obstacle `x y`")),
            }
            i += 1;
        }
        if i == lines.len() {
            return Err(bad(i, "missing `pois` header"));
        }
        let mut length = None;
        let mut width = None;
        while i < lines.len() {
            let slot = match lines[i] {
                "length" => &mut length,
                "width" => &mut width,
                _ => {
                    i += 1;
                    continue;
                }
            };
            let value = lines
                .get(i + 1)
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .ok_or_else(|| bad(i + 1, "expected a positive integer"))?;
            *slot = Some(value);
            i += 2;
        }
        match (length, width) {
            (Some(l), Some(w)) => Ok(Self::new(l, w, obstacles)),
            _ => Err(bad(lines.len(), "missing `length` or `width`")),
        }
    }

    #[inline]
    pub fn is_free(&self, c: Cell) -> bool {
        (0..self.length).contains(&c.0) && (0..self.width).contains(&c.1) && !self.obstacles.contains(&c)
    }

    /// Free cells visible from `c` along the 8 rays.
    pub fn neighbors(&self, c: Cell) -> Vec<Cell> {
        let mut out = Vec::new();
        for (dx, dy) in DIRECTIONS {
            let mut n = (c.0 + dx, c.1 + dy);
            while self.is_free(n) {
                out.push(n);
                n = (n.0 + dx, n.1 + dy);
            }
        }
        out
    }

    /// `b` lies on a clear ray from `a`.
    pub fn sees(&self, a: Cell, b: Cell) -> bool {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        if (dx, dy) == (0, 0) || !(dx == 0 || dy == 0 || dx.abs() == dy.abs()) {
            return false;
        }
        let step = (dx.signum(), dy.signum());
        let mut n = a;
        while n != b {
            n = (n.0 + step.0, n.1 + step.1);
            if !self.is_free(n) {
                return false;
            }
        }
        true
    }

    /// Cheapest path from `from` to `to` by Euclidean length.
    pub fn shortest_path(&self, from: Cell, to: Cell) -> Result<Projection<Cell>, ProjectionError> {
        for c in [from, to] {
            if !self.is_free(c) {
                return Err(ProjectionError::Blocked { cell: c });
            }
        }
        let mut dist: HashMap<Cell, f64> = HashMap::from([(from, 0.0)]);
        let mut prev: HashMap<Cell, Cell> = HashMap::new();
        let mut heap = BinaryHeap::from([Visit {
            cost: 0.0,
            cell: from,
        }]);
        while let Some(Visit { cost, cell }) = heap.pop() {
            if cell == to {
                let mut path = vec![to];
                let mut cur = to;
                while let Some(&p) = prev.get(&cur) {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return Ok(Projection { path, cost });
            }
            if dist.get(&cell).is_some_and(|&d| cost > d) {
                continue;
            }
            for n in self.neighbors(cell) {
                let next = cost + cell_distance(cell, n);
                if dist.get(&n).map_or(true, |&d| next < d) {
                    dist.insert(n, next);
                    prev.insert(n, cell);
                    heap.push(Visit { cost: next, cell: n });
                }
            }
        }
        Err(ProjectionError::Unreachable { from, to })
    }
}

/// Dijkstra queue entry, min-cost first.
struct Visit {
    cost: f64,
    cell: Cell,
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
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

fn cell_distance(a: Cell, b: Cell) -> f64 {
    (Vector2::new(a.0 as f64, a.1 as f64) - Vector2::new(b.0 as f64, b.1 as f64)).norm()
}

/// Mapping from coordinates to cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCfg {
    /// Coordinate units per grid cell.
    pub cell_size: f64,
}

impl Default for GridCfg {
    fn default() -> Self {
        Self { cell_size: 5.0 }
    }
}

impl GridCfg {
    pub fn cell_of(&self, x: f64, y: f64) -> Cell {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }
}

/// Projects node walks onto a `GridWorld`.
#[derive(Clone, Debug)]
pub struct GridProjector<N> {
    world: GridWorld,
    cells: HashMap<N, Cell>,
}

impl<N: Eq + Hash> GridProjector<N> {
    pub fn new(world: GridWorld, cells: HashMap<N, Cell>) -> Self {
        Self { world, cells }
    }

    /// Place nodes from `(node, x, y)` coordinates using `cfg`.
    pub fn from_coords<I>(world: GridWorld, coords: I, cfg: GridCfg) -> Self
    where
        I: IntoIterator<Item = (N, f64, f64)>,
    {
        let cells = coords
            .into_iter()
            .map(|(n, x, y)| (n, cfg.cell_of(x, y)))
            .collect();
        Self::new(world, cells)
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }
}

impl<N: Eq + Hash + fmt::Debug> PathProjector<N> for GridProjector<N> {
    type Point = Cell;

    fn project(&self, waypoints: &[N]) -> Result<Projection<Cell>, ProjectionError> {
        let cells = waypoints
            .iter()
            .map(|n| {
                self.cells
                    .get(n)
                    .copied()
                    .ok_or_else(|| ProjectionError::Unmapped {
                        node: format!("{n:?}"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let Some(&first) = cells.first() else {
            return Ok(Projection {
                path: Vec::new(),
                cost: 0.0,
            });
        };
        if !self.world.is_free(first) {
            return Err(ProjectionError::Blocked { cell: first });
        }
        let mut path = vec![first];
        let mut cost = 0.0;
        for w in cells.windows(2) {
            let (u, v) = (w[0], w[1]);
            if u == v {
                continue;
            }
            if self.world.sees(u, v) {
                path.push(v);
                cost += cell_distance(u, v);
            } else {
                let leg = self.world.shortest_path(u, v)?;
                path.extend_from_slice(&leg.path[1..]);
                cost += leg.cost;
            }
        }
        Ok(Projection { path, cost })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: &str = "obs\n1 0\n1 1\n1 2\npois\nlength\n4\nwidth\n4\n";

    #[test]
    fn parses_world_file() {
        let w = GridWorld::parse(WORLD).unwrap();
        assert_eq!((w.length, w.width), (4, 4));
        assert_eq!(w.obstacles.len(), 3);
        assert!(!w.is_free((1, 1)));
        assert!(w.is_free((1, 3)));
        assert!(!w.is_free((4, 0)));
        assert!(matches!(
            GridWorld::parse("obs\n1 x\npois\n"),
            Err(ProjectionError::Malformed { line: 2, .. })
        ));
        assert!(GridWorld::parse("pois\nlength\n4\nwidth\n4\n").is_err());
    }

    #[test]
    fn rays_stop_at_obstacles() {
        let w = GridWorld::parse(WORLD).unwrap();
        let n = w.neighbors((0, 0));
        assert!(n.contains(&(0, 3)));
        assert!(!n.contains(&(1, 0)));
        assert!(!n.contains(&(2, 0)));
        assert!(!n.contains(&(1, 1)));
        assert!(w.sees((0, 0), (0, 3)));
        assert!(!w.sees((0, 0), (2, 0)));
        assert!(!w.sees((0, 0), (2, 1)));
    }

    #[test]
    fn detours_around_the_wall() {
        let w = GridWorld::parse(WORLD).unwrap();
        let p = w.shortest_path((0, 0), (2, 0)).unwrap();
        assert_eq!(p.path.first(), Some(&(0, 0)));
        assert_eq!(p.path.last(), Some(&(2, 0)));
        assert!(p.path.contains(&(1, 3)));
        // Cheapest detour: up 2, diagonal to (1,3), diagonal to (2,2), down 2.
        let expected = 2.0 + 2.0 * 2f64.sqrt() + 2.0;
        assert!((p.cost - expected).abs() < 1e-9, "cost {}", p.cost);
    }

    #[test]
    fn walled_off_target_is_unreachable() {
        let w = GridWorld::new(3, 1, [(1, 0)]);
        assert_eq!(
            w.shortest_path((0, 0), (2, 0)),
            Err(ProjectionError::Unreachable {
                from: (0, 0),
                to: (2, 0)
            })
        );
        assert!(matches!(
            w.shortest_path((0, 0), (1, 0)),
            Err(ProjectionError::Blocked { .. })
        ));
    }

    #[test]
    fn projects_waypoints() {
        let w = GridWorld::parse(WORLD).unwrap();
        let proj = GridProjector::from_coords(
            w,
            [("a", 0.0, 0.0), ("b", 0.0, 15.0), ("c", 10.0, 0.0)],
            GridCfg::default(),
        );
        assert_eq!((proj.world().length, proj.world().width), (4, 4));
        let out = proj.project(&["a", "b", "c"]).unwrap();
        assert_eq!(out.path.first(), Some(&(0, 0)));
        assert_eq!(out.path[1], (0, 3));
        assert_eq!(out.path.last(), Some(&(2, 0)));
        assert!(out.cost > 3.0);
        assert!(matches!(
            proj.project(&["a", "zz"]),
            Err(ProjectionError::Unmapped { .. })
        ));
    }
}
