//! Edge derivation from face connectivity.

use std::collections::HashSet;

use crate::mesh::Face;

/// Unique edges of a face list as `[v_min, v_max]`, in first-seen order.
///
/// Quads contribute their four boundary edges only; diagonals are not
/// edges of the surface.
pub fn derive_edges(faces: &[Face]) -> Vec<[u32; 2]> {
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut edges = Vec::new();

    for face in faces {
        let corners: Vec<u32> = face.corners().collect();
        for k in 0..corners.len() {
            let (a, b) = (corners[k], corners[(k + 1) % corners.len()]);
            let key = if a < b { (a, b) } else { (b, a) };
            if seen.insert(key) {
                edges.push([key.0, key.1]);
            }
        }
    }

    edges
}
