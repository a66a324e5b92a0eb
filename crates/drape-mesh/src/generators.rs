//! Procedural surface generators for demos and testing.
//!
//! These generators produce deterministic, resolution-configurable surfaces
//! with consistent winding order.

use std::f32::consts::PI;

use drape_math::Vec3;

use crate::mesh::{Face, Surface};
use crate::topology::derive_edges;

/// Generates a flat rectangular grid of quads in the XZ plane at height `y = 0`.
///
/// The grid spans `[-width/2, width/2]` in X and `[-depth/2, depth/2]` in Z.
/// Vertex `(i, j)` has index `j * (cols + 1) + i`, so row 0 is the
/// `z = -depth/2` edge.
///
/// # Example
/// ```
/// use drape_mesh::generators::quad_grid;
/// let surface = quad_grid(2, 2, 1.0, 1.0);
/// assert_eq!(surface.vertex_count(), 9);
/// assert_eq!(surface.face_count(), 4);
/// assert_eq!(surface.edge_count(), 12);
/// ```
pub fn quad_grid(cols: usize, rows: usize, width: f32, depth: f32) -> Surface {
    let verts_x = cols + 1;
    let verts_z = rows + 1;
    let mut positions = Vec::with_capacity(verts_x * verts_z);

    for j in 0..verts_z {
        for i in 0..verts_x {
            let u = i as f32 / cols.max(1) as f32;
            let v = j as f32 / rows.max(1) as f32;
            positions.push(Vec3::new(-0.5 * width + u * width, 0.0, -0.5 * depth + v * depth));
        }
    }

    let mut faces = Vec::with_capacity(cols * rows);
    for j in 0..rows {
        for i in 0..cols {
            let a = (j * verts_x + i) as u32;
            let b = a + 1;
            let d = a + verts_x as u32;
            let c = d + 1;
            faces.push(Face::quad(a, d, c, b));
        }
    }

    let edges = derive_edges(&faces);
    Surface {
        positions,
        edges,
        faces,
    }
}

/// Generates a flat grid like [`quad_grid`] but with every quad split into two triangles.
pub fn triangle_grid(cols: usize, rows: usize, width: f32, depth: f32) -> Surface {
    let quads = quad_grid(cols, rows, width, depth);
    let mut faces = Vec::with_capacity(quads.faces.len() * 2);
    for face in &quads.faces {
        let (t0, t1) = face.triangles();
        faces.push(Face::tri(t0[0], t0[1], t0[2]));
        if let Some(t1) = t1 {
            faces.push(Face::tri(t1[0], t1[1], t1[2]));
        }
    }
    let edges = derive_edges(&faces);
    Surface {
        positions: quads.positions,
        edges,
        faces,
    }
}

/// Generates a UV sphere of triangles centered at `center`.
///
/// # Arguments
/// - `radius`: Sphere radius in meters.
/// - `stacks`: Number of horizontal slices (latitude divisions).
/// - `slices`: Number of vertical slices (longitude divisions).
pub fn uv_sphere(center: Vec3, radius: f32, stacks: usize, slices: usize) -> Surface {
    let mut positions = Vec::with_capacity((stacks + 1) * (slices + 1));

    for i in 0..=stacks {
        let phi = PI * i as f32 / stacks as f32;
        for j in 0..=slices {
            let theta = 2.0 * PI * j as f32 / slices as f32;
            let dir = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            positions.push(center + dir * radius);
        }
    }

    let mut faces = Vec::with_capacity(stacks * slices * 2);
    for i in 0..stacks {
        for j in 0..slices {
            let a = (i * (slices + 1) + j) as u32;
            let b = a + (slices + 1) as u32;

            // Skip degenerate triangles at poles
            if i != 0 {
                faces.push(Face::tri(a, b, a + 1));
            }
            if i != stacks - 1 {
                faces.push(Face::tri(a + 1, b, b + 1));
            }
        }
    }

    let edges = derive_edges(&faces);
    Surface {
        positions,
        edges,
        faces,
    }
}

/// A single quad: four vertices, four edges, one face.
pub fn single_quad(size: f32) -> Surface {
    quad_grid(1, 1, size, size)
}
