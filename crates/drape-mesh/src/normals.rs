//! Face normal computation.

use drape_math::Vec3;

use crate::mesh::Face;

/// Unit normal of a face at `positions`.
///
/// Quads use the cross product of their diagonals, which stays well
/// defined for non-planar quads. Degenerate faces yield zero.
pub fn face_normal(face: &Face, positions: &[Vec3]) -> Vec3 {
    let [a, b, c] = face.v;
    let pa = positions[a as usize];
    let pb = positions[b as usize];
    let pc = positions[c as usize];
    match face.v4 {
        Some(d) => {
            let pd = positions[d as usize];
            (pc - pa).cross(pd - pb).normalize_or_zero()
        }
        None => (pb - pa).cross(pc - pa).normalize_or_zero(),
    }
}

/// Area-weighted vertex normals accumulated from adjacent faces.
pub fn vertex_normals(faces: &[Face], positions: &[Vec3]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for face in faces {
        let (t0, t1) = face.triangles();
        for tri in std::iter::once(t0).chain(t1) {
            let [a, b, c] = tri.map(|i| i as usize);
            let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
    }
    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}
