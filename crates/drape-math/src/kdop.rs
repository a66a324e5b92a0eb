//! Discrete oriented polytopes (k-DOPs).
//!
//! A k-DOP bounds a point set by `K/2` slabs, one per fixed direction.
//! The 13 directions below cover every supported `K`: the three
//! coordinate axes, the four cube diagonals and the six edge diagonals.
//! Directions are unit length, so slab extents are in world units.

use glam::Vec3;
use serde::{Deserialize, Serialize};

const INV_SQRT2: f32 = std::f32::consts::FRAC_1_SQRT_2;
const INV_SQRT3: f32 = 0.577_350_26;

/// All k-DOP directions, unit length.
pub const KDOP_AXES: [Vec3; 13] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(INV_SQRT3, INV_SQRT3, INV_SQRT3),
    Vec3::new(INV_SQRT3, -INV_SQRT3, INV_SQRT3),
    Vec3::new(INV_SQRT3, INV_SQRT3, -INV_SQRT3),
    Vec3::new(INV_SQRT3, -INV_SQRT3, -INV_SQRT3),
    Vec3::new(INV_SQRT2, INV_SQRT2, 0.0),
    Vec3::new(INV_SQRT2, 0.0, INV_SQRT2),
    Vec3::new(0.0, INV_SQRT2, INV_SQRT2),
    Vec3::new(INV_SQRT2, -INV_SQRT2, 0.0),
    Vec3::new(INV_SQRT2, 0.0, -INV_SQRT2),
    Vec3::new(0.0, INV_SQRT2, -INV_SQRT2),
];

/// Number of bounding planes (`K`) of a k-DOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KdopType {
    /// Axis-aligned box.
    Dop6,
    /// Cube diagonals only.
    Dop8,
    /// Coordinate axes + cube diagonals.
    Dop14,
    /// Coordinate axes + edge diagonals.
    Dop18,
    /// All thirteen directions.
    #[default]
    Dop26,
}

impl KdopType {
    /// Indices into [`KDOP_AXES`] used by this k-DOP.
    pub fn axes(self) -> &'static [usize] {
        match self {
            KdopType::Dop6 => &[0, 1, 2],
            KdopType::Dop8 => &[3, 4, 5, 6],
            KdopType::Dop14 => &[0, 1, 2, 3, 4, 5, 6],
            KdopType::Dop18 => &[0, 1, 2, 7, 8, 9, 10, 11, 12],
            KdopType::Dop26 => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        }
    }

    /// Number of bounding planes.
    pub fn k(self) -> usize {
        self.axes().len() * 2
    }

    /// Parses a plane count into a k-DOP type.
    pub fn from_k(k: usize) -> Option<Self> {
        match k {
            6 => Some(KdopType::Dop6),
            8 => Some(KdopType::Dop8),
            14 => Some(KdopType::Dop14),
            18 => Some(KdopType::Dop18),
            26 => Some(KdopType::Dop26),
            _ => None,
        }
    }
}

/// Slab bounds along every direction in [`KDOP_AXES`].
///
/// Only the slabs named by a [`KdopType`] are meaningful; the others stay
/// empty. Every operation takes the type so callers never mix slab sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kdop {
    pub min: [f32; 13],
    pub max: [f32; 13],
}

impl Kdop {
    /// The empty k-DOP: adding any point makes it that point.
    pub const EMPTY: Self = Self {
        min: [f32::MAX; 13],
        max: [f32::MIN; 13],
    };

    /// Grows the slabs to contain `p`.
    #[inline]
    pub fn add_point(&mut self, kind: KdopType, p: Vec3) {
        for &axis in kind.axes() {
            let d = p.dot(KDOP_AXES[axis]);
            if d < self.min[axis] {
                self.min[axis] = d;
            }
            if d > self.max[axis] {
                self.max[axis] = d;
            }
        }
    }

    /// Grows the slabs to contain `other`.
    #[inline]
    pub fn union_with(&mut self, kind: KdopType, other: &Kdop) {
        for &axis in kind.axes() {
            self.min[axis] = self.min[axis].min(other.min[axis]);
            self.max[axis] = self.max[axis].max(other.max[axis]);
        }
    }

    /// Pushes every slab outward by `epsilon` on both sides.
    #[inline]
    pub fn inflate(&mut self, kind: KdopType, epsilon: f32) {
        for &axis in kind.axes() {
            self.min[axis] -= epsilon;
            self.max[axis] += epsilon;
        }
    }

    /// Returns true unless some slab pair is disjoint.
    #[inline]
    pub fn overlaps(&self, kind: KdopType, other: &Kdop) -> bool {
        kind.axes()
            .iter()
            .all(|&axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    /// Returns true if every slab of `other` lies inside this one.
    pub fn contains(&self, kind: KdopType, other: &Kdop) -> bool {
        kind.axes()
            .iter()
            .all(|&axis| self.min[axis] <= other.min[axis] && other.max[axis] <= self.max[axis])
    }

    /// The direction (index into [`KDOP_AXES`]) with the widest extent.
    pub fn longest_axis(&self, kind: KdopType) -> usize {
        let axes = kind.axes();
        let mut best = axes[0];
        let mut best_extent = f32::MIN;
        for &axis in axes {
            let extent = self.max[axis] - self.min[axis];
            if extent > best_extent {
                best_extent = extent;
                best = axis;
            }
        }
        best
    }

    /// Midpoint of the slab along `axis`.
    #[inline]
    pub fn center(&self, axis: usize) -> f32 {
        0.5 * (self.min[axis] + self.max[axis])
    }
}

impl Default for Kdop {
    fn default() -> Self {
        Self::EMPTY
    }
}
