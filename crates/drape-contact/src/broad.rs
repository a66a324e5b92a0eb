//! Dual-tree broad phase.
//!
//! Descends two bounding volume trees together and reports every pair of
//! leaves whose bounds overlap. The same tree may be passed on both sides
//! for self-collision, in which case the normal-cone test additionally
//! prunes subtrees too flat to fold onto each other, each unordered face
//! pair is reported once, and a face is never paired with itself.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::bvh::{BoundingVolumeTree, BvtNode, NodeId};

/// Leaf pair reported by the broad phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    /// Face index in the first tree.
    pub face_a: u32,
    /// Face index in the second tree.
    pub face_b: u32,
}

/// Normal-cone test: true if the two subtrees cannot fold onto each other.
#[inline]
fn cones_disjoint(a: &BvtNode, b: &BvtNode) -> bool {
    let angle = if a.normal == b.normal {
        0.0
    } else {
        a.normal.dot(b.normal).clamp(-1.0, 1.0).acos()
    };
    angle * 0.5 + a.alpha.max(b.alpha) > PI
}

struct Traversal<'a, F> {
    a: &'a BoundingVolumeTree,
    b: &'a BoundingVolumeTree,
    self_collision: bool,
    on_pair: F,
}

impl<F: FnMut(u32, u32)> Traversal<'_, F> {
    fn visit(&mut self, ia: NodeId, ib: NodeId) -> bool {
        let (a, b) = (self.a, self.b);
        let na = &a.nodes()[ia.index()];
        let nb = &b.nodes()[ib.index()];

        if !na.bound.overlaps(a.kind(), &nb.bound) {
            return false;
        }
        if self.self_collision && cones_disjoint(na, nb) {
            return false;
        }

        match (na.is_leaf, nb.is_leaf) {
            (true, true) => {
                if self.self_collision && na.face >= nb.face {
                    return false;
                }
                (self.on_pair)(na.face, nb.face);
                true
            }
            (false, _) => {
                let mut hit = false;
                for child in na.child_ids() {
                    hit |= self.visit(child, ib);
                }
                hit
            }
            (true, false) => {
                let mut hit = false;
                for child in nb.child_ids() {
                    hit |= self.visit(ia, child);
                }
                hit
            }
        }
    }
}

/// Traverses `tree_a` against `tree_b`, calling `on_pair(face_a, face_b)`
/// for every overlapping leaf pair.
///
/// Returns true if any pair was reported. Both trees must use the same
/// [`drape_math::KdopType`].
pub fn traverse<F>(tree_a: &BoundingVolumeTree, tree_b: &BoundingVolumeTree, self_collision: bool, on_pair: F) -> bool
where
    F: FnMut(u32, u32),
{
    let (Some(ra), Some(rb)) = (tree_a.root(), tree_b.root()) else {
        return false;
    };
    debug_assert_eq!(tree_a.kind(), tree_b.kind());
    let mut traversal = Traversal {
        a: tree_a,
        b: tree_b,
        self_collision,
        on_pair,
    };
    traversal.visit(ra, rb)
}

/// Collects every overlapping leaf pair of `tree_a` against `tree_b`.
pub fn collect_pairs(tree_a: &BoundingVolumeTree, tree_b: &BoundingVolumeTree, self_collision: bool) -> Vec<CandidatePair> {
    let mut pairs = Vec::new();
    traverse(tree_a, tree_b, self_collision, |face_a, face_b| {
        pairs.push(CandidatePair { face_a, face_b });
    });
    pairs
}
