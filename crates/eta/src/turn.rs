//! Turn classification and the running turn count of a walk.
//!
//! A turn is the angle between the incoming segment `a→b` and the outgoing
//! segment `b→c` at the middle waypoint, in `[0, π]`.
//! - `Straight`: angle ≤ `soft_angle` (45° by default), no effect.
//! - `Soft`: above `soft_angle` up to `hard_angle` (90°), count + 1.
//! - `Hard`: above `hard_angle`, count jumps to at least the limit, so the walk
//!   can no longer be expanded (and is infeasible when it was already at it).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::geo::TurnGeometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Straight,
    Soft,
    Hard,
}

/// Turn bound and thresholds (radians).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnCfg {
    pub limit: u32,
    pub soft_angle: f64,
    pub hard_angle: f64,
}

impl TurnCfg {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

impl Default for TurnCfg {
    fn default() -> Self {
        Self {
            limit: 3,
            soft_angle: FRAC_PI_4,
            hard_angle: FRAC_PI_2,
        }
    }
}

/// Applies a `TurnCfg` to angles and running counts.
#[derive(Clone, Copy, Debug)]
pub struct TurnCounter {
    cfg: TurnCfg,
}

impl TurnCounter {
    pub fn new(cfg: TurnCfg) -> Self {
        Self { cfg }
    }

    #[inline]
    pub fn limit(&self) -> u32 {
        self.cfg.limit
    }

    /// NaN (degenerate, zero-length segments) classifies as `Straight`.
    pub fn classify(&self, angle: f64) -> Turn {
        if angle > self.cfg.hard_angle {
            Turn::Hard
        } else if angle > self.cfg.soft_angle {
            Turn::Soft
        } else {
            Turn::Straight
        }
    }

    pub fn advance(&self, count: u32, turn: Turn) -> u32 {
        match turn {
            Turn::Straight => count,
            Turn::Soft => count.saturating_add(1),
            Turn::Hard => count.saturating_add(1).max(self.cfg.limit),
        }
    }

    /// Classify the turn at `b` on `a → b → c` and fold it into `count`.
    pub fn observe<N, G>(&self, geometry: &G, a: &N, b: &N, c: &N, count: u32) -> u32
    where
        G: TurnGeometry<N> + ?Sized,
    {
        self.advance(count, self.classify(geometry.angle(a, b, c)))
    }

    /// A walk with this count may be reported.
    #[inline]
    pub fn is_feasible(&self, count: u32) -> bool {
        count <= self.cfg.limit
    }

    /// A walk with this count may still grow.
    #[inline]
    pub fn can_expand(&self, count: u32) -> bool {
        count < self.cfg.limit
    }
}
