//! Narrow phase: exact triangle proximity for broad-phase candidates.
//!
//! Each face of a candidate pair is split into its one or two triangles,
//! giving up to four triangle-pair tests. A test within `epsilon` becomes
//! a [`CollisionPair`] carrying the nearest points, a unit normal from
//! side B toward side A and the barycentric weights of both contact
//! points, ready for the impulse response.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use drape_math::{barycentric_weights, triangle_normal, triangle_proximity, Vec3};
use drape_mesh::Face;
use drape_types::constants::ALMOST_ZERO;

use crate::broad::CandidatePair;

/// What side B of a contact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactSource {
    /// The obstacle at this index.
    Obstacle(usize),
    /// The cloth itself.
    SelfCloth,
}

/// A triangle pair found within contact distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionPair {
    /// Cloth triangle corners.
    pub indices_a: [u32; 3],
    /// Corners of the other triangle, indexing the side named by `source`.
    pub indices_b: [u32; 3],
    /// Nearest point on triangle A.
    pub pa: Vec3,
    /// Nearest point on triangle B.
    pub pb: Vec3,
    /// Unit contact normal, pointing from B toward A.
    pub normal: Vec3,
    pub distance: f32,
    /// Barycentric weights of `pa` on triangle A.
    pub weights_a: [f32; 3],
    /// Barycentric weights of `pb` on triangle B.
    pub weights_b: [f32; 3],
    pub source: ContactSource,
}

impl CollisionPair {
    /// Returns true if the triangles actually intersect.
    pub fn is_intersecting(&self) -> bool {
        self.distance <= ALMOST_ZERO
    }
}

/// Faces and positions of one side of a contact query.
#[derive(Debug, Clone, Copy)]
pub struct ContactSide<'a> {
    pub faces: &'a [Face],
    pub positions: &'a [Vec3],
}

impl<'a> ContactSide<'a> {
    pub fn new(faces: &'a [Face], positions: &'a [Vec3]) -> Self {
        Self { faces, positions }
    }

    #[inline]
    fn corners(&self, tri: [u32; 3]) -> [Vec3; 3] {
        tri.map(|v| self.positions[v as usize])
    }
}

/// Tests one triangle pair.
pub fn test_triangles(
    side_a: &ContactSide<'_>,
    tri_a: [u32; 3],
    side_b: &ContactSide<'_>,
    tri_b: [u32; 3],
    source: ContactSource,
    epsilon: f32,
) -> Option<CollisionPair> {
    let ta = side_a.corners(tri_a);
    let tb = side_b.corners(tri_b);
    let proximity = triangle_proximity(ta, tb);
    if proximity.distance > epsilon {
        return None;
    }

    let normal = if proximity.distance > ALMOST_ZERO {
        proximity.vector / proximity.distance
    } else {
        // Intersecting: B's face normal, turned toward A.
        let nb = triangle_normal(tb[0], tb[1], tb[2]);
        let centroid_a = (ta[0] + ta[1] + ta[2]) / 3.0;
        let centroid_b = (tb[0] + tb[1] + tb[2]) / 3.0;
        if (centroid_a - centroid_b).dot(nb) < 0.0 {
            -nb
        } else {
            nb
        }
    };
    if normal == Vec3::ZERO {
        return None;
    }

    Some(CollisionPair {
        indices_a: tri_a,
        indices_b: tri_b,
        pa: proximity.pa,
        pb: proximity.pb,
        normal,
        distance: proximity.distance,
        weights_a: barycentric_weights(proximity.pa, ta[0], ta[1], ta[2]),
        weights_b: barycentric_weights(proximity.pb, tb[0], tb[1], tb[2]),
        source,
    })
}

#[inline]
fn shares_corner(a: [u32; 3], b: [u32; 3]) -> bool {
    a.iter().any(|v| b.contains(v))
}

fn test_candidate(
    candidate: &CandidatePair,
    side_a: &ContactSide<'_>,
    side_b: &ContactSide<'_>,
    source: ContactSource,
    epsilon: f32,
) -> Vec<CollisionPair> {
    let face_a = &side_a.faces[candidate.face_a as usize];
    let face_b = &side_b.faces[candidate.face_b as usize];
    let self_contact = source == ContactSource::SelfCloth;
    if self_contact && face_a.shares_vertex(face_b) {
        return Vec::new();
    }

    let (a0, a1) = face_a.triangles();
    let (b0, b1) = face_b.triangles();
    let mut pairs = Vec::new();
    for tri_a in std::iter::once(a0).chain(a1) {
        for tri_b in std::iter::once(b0).chain(b1) {
            if self_contact && shares_corner(tri_a, tri_b) {
                continue;
            }
            if let Some(pair) = test_triangles(side_a, tri_a, side_b, tri_b, source, epsilon) {
                pairs.push(pair);
            }
        }
    }
    pairs
}

/// Converts broad-phase candidates into contacts within `epsilon`.
///
/// Candidate tests are independent and run on the rayon pool when
/// `parallel` is set; the output order follows the candidate order
/// either way.
pub fn detect(
    candidates: &[CandidatePair],
    side_a: ContactSide<'_>,
    side_b: ContactSide<'_>,
    source: ContactSource,
    epsilon: f32,
    parallel: bool,
) -> Vec<CollisionPair> {
    if parallel {
        candidates
            .par_iter()
            .flat_map_iter(|c| test_candidate(c, &side_a, &side_b, source, epsilon))
            .collect()
    } else {
        candidates
            .iter()
            .flat_map(|c| test_candidate(c, &side_a, &side_b, source, epsilon))
            .collect()
    }
}
