//! Angle sources for the turn predicate.
//!
//! - `TurnGeometry`: `angle(a, b, c)` between `a→b` and `b→c`, radians in `[0, π]`.
//!   Any `Fn(&N, &N, &N) -> f64` qualifies.
//! - `PlanarCoords`: Euclidean positions (grid worlds, projected maps).
//! - `SphericalCoords`: longitude/latitude in degrees, compared by initial bearings.
//!
//! Zero-length segments yield an angle of `0` (no turn).

use std::collections::HashMap;
use std::f64::consts::PI;
use std::hash::Hash;

use nalgebra::Vector2;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub trait TurnGeometry<N> {
    fn angle(&self, a: &N, b: &N, c: &N) -> f64;

    /// Whether `angle` is meaningful for `node`. Checked once before a search.
    fn covers(&self, _node: &N) -> bool {
        true
    }
}

impl<N, F> TurnGeometry<N> for F
where
    F: Fn(&N, &N, &N) -> f64,
{
    fn angle(&self, a: &N, b: &N, c: &N) -> f64 {
        self(a, b, c)
    }
}

/// Angle between `p2 - p1` and `p3 - p2`.
pub fn planar_angle(p1: Vector2<f64>, p2: Vector2<f64>, p3: Vector2<f64>) -> f64 {
    let a = p2 - p1;
    let b = p3 - p2;
    let na = a.norm();
    let nb = b.norm();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (a.dot(&b) / (na * nb)).clamp(-1.0, 1.0).acos()
}

/// Initial bearing from `(lat1)` to `(lat2)` across longitude difference `dlon`, radians in `[-π, π]`.
pub fn bearing(lat1: f64, lat2: f64, dlon: f64) -> f64 {
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x)
}

/// Bearing change at `p2` for points given as `(lon, lat)` in degrees.
pub fn spherical_angle(p1: Vector2<f64>, p2: Vector2<f64>, p3: Vector2<f64>) -> f64 {
    if p1 == p2 || p2 == p3 {
        return 0.0;
    }
    let (lat1, lat2, lat3) = (p1.y.to_radians(), p2.y.to_radians(), p3.y.to_radians());
    let b12 = bearing(lat1, lat2, (p2.x - p1.x).to_radians());
    let b23 = bearing(lat2, lat3, (p3.x - p2.x).to_radians());
    let d = (b23 - b12).abs();
    if d > PI {
        2.0 * PI - d
    } else {
        d
    }
}

/// Great-circle distance in metres between two `(lon, lat)` points in degrees.
pub fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * EARTH_RADIUS_M
}

/// Node positions in the plane.
#[derive(Clone, Debug, Default)]
pub struct PlanarCoords<N> {
    pos: HashMap<N, Vector2<f64>>,
}

impl<N: Eq + Hash> PlanarCoords<N> {
    pub fn new() -> Self {
        Self {
            pos: HashMap::new(),
        }
    }

    pub fn insert(&mut self, node: N, x: f64, y: f64) {
        self.pos.insert(node, Vector2::new(x, y));
    }

    pub fn get(&self, node: &N) -> Option<Vector2<f64>> {
        self.pos.get(node).copied()
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }
}

impl<N: Eq + Hash> FromIterator<(N, f64, f64)> for PlanarCoords<N> {
    fn from_iter<T: IntoIterator<Item = (N, f64, f64)>>(iter: T) -> Self {
        let mut c = Self::new();
        for (n, x, y) in iter {
            c.insert(n, x, y);
        }
        c
    }
}

impl<N: Eq + Hash> TurnGeometry<N> for PlanarCoords<N> {
    fn angle(&self, a: &N, b: &N, c: &N) -> f64 {
        match (self.get(a), self.get(b), self.get(c)) {
            (Some(pa), Some(pb), Some(pc)) => planar_angle(pa, pb, pc),
            _ => 0.0,
        }
    }

    fn covers(&self, node: &N) -> bool {
        self.pos.contains_key(node)
    }
}

/// Node positions as `(lon, lat)` degrees.
#[derive(Clone, Debug, Default)]
pub struct SphericalCoords<N> {
    inner: PlanarCoords<N>,
}

impl<N: Eq + Hash> SphericalCoords<N> {
    pub fn new() -> Self {
        Self {
            inner: PlanarCoords::new(),
        }
    }

    pub fn insert(&mut self, node: N, lon: f64, lat: f64) {
        self.inner.insert(node, lon, lat);
    }

    /// Great-circle length of `{a, b}` in metres, if both ends are known.
    pub fn distance(&self, a: &N, b: &N) -> Option<f64> {
        let pa = self.inner.get(a)?;
        let pb = self.inner.get(b)?;
        Some(haversine(pa.x, pa.y, pb.x, pb.y))
    }
}

impl<N: Eq + Hash> FromIterator<(N, f64, f64)> for SphericalCoords<N> {
    fn from_iter<T: IntoIterator<Item = (N, f64, f64)>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<N: Eq + Hash> TurnGeometry<N> for SphericalCoords<N> {
    fn angle(&self, a: &N, b: &N, c: &N) -> f64 {
        match (self.inner.get(a), self.inner.get(b), self.inner.get(c)) {
            (Some(pa), Some(pb), Some(pc)) => spherical_angle(pa, pb, pc),
            _ => 0.0,
        }
    }

    fn covers(&self, node: &N) -> bool {
        self.inner.covers(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn planar_angles() {
        let o = vector![0.0, 0.0];
        let e = vector![1.0, 0.0];
        assert!(planar_angle(o, e, vector![2.0, 0.0]).abs() < 1e-12);
        assert!((planar_angle(o, e, vector![1.0, 1.0]) - FRAC_PI_2).abs() < 1e-12);
        assert!((planar_angle(o, e, o) - PI).abs() < 1e-12);
        assert_eq!(planar_angle(o, o, e), 0.0);
    }

    #[test]
    fn spherical_right_turn_near_equator() {
        // East along the equator, then due north.
        let a = spherical_angle(vector![0.0, 0.0], vector![0.01, 0.0], vector![0.01, 0.01]);
        assert!((a - FRAC_PI_2).abs() < 1e-3);
        let straight = spherical_angle(vector![0.0, 0.0], vector![0.01, 0.0], vector![0.02, 0.0]);
        assert!(straight.abs() < 1e-9);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = haversine(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 1.0, "got {d}");
        assert_eq!(haversine(13.4, 52.5, 13.4, 52.5), 0.0);
    }

    #[test]
    fn coordinate_maps_cover_known_nodes() {
        let c: PlanarCoords<&str> = [("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 1.0, 1.0)]
            .into_iter()
            .collect();
        assert!(c.covers(&"a"));
        assert!(!c.covers(&"z"));
        assert!((c.angle(&"a", &"b", &"c") - FRAC_PI_2).abs() < 1e-12);

        let s: SphericalCoords<u32> = [(1, 0.0, 0.0), (2, 0.0, 1.0)].into_iter().collect();
        assert!((s.distance(&1, &2).unwrap() - 111_195.0).abs() < 1.0);
        assert!(s.distance(&1, &3).is_none());
    }
}
