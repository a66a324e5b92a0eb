//! Surface representation: vertex positions, edges and faces.
//!
//! Faces are triangles or quads. A quad is a triangle with a fourth
//! index present; collision code splits it into `(v0, v1, v2)` and
//! `(v2, v3, v0)`.

use drape_math::Vec3;
use serde::{Deserialize, Serialize};
use drape_types::{DrapeError, DrapeResult};

use crate::topology::derive_edges;

/// A triangle or quad face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Face {
    /// First three corners.
    pub v: [u32; 3],
    /// Fourth corner for quads.
    pub v4: Option<u32>,
}

impl Face {
    /// Creates a triangle.
    pub fn tri(a: u32, b: u32, c: u32) -> Self {
        Self { v: [a, b, c], v4: None }
    }

    /// Creates a quad with corners in winding order.
    pub fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self {
            v: [a, b, c],
            v4: Some(d),
        }
    }

    /// Returns true if the face has a fourth corner.
    #[inline]
    pub fn is_quad(&self) -> bool {
        self.v4.is_some()
    }

    /// Number of corners (3 or 4).
    #[inline]
    pub fn corner_count(&self) -> usize {
        if self.is_quad() {
            4
        } else {
            3
        }
    }

    /// Corner indices in winding order.
    pub fn corners(&self) -> impl Iterator<Item = u32> + '_ {
        self.v.iter().copied().chain(self.v4)
    }

    /// The one or two triangles making up this face.
    #[inline]
    pub fn triangles(&self) -> ([u32; 3], Option<[u32; 3]>) {
        let [a, b, c] = self.v;
        ([a, b, c], self.v4.map(|d| [c, d, a]))
    }

    /// Returns true if the two faces share at least one corner.
    pub fn shares_vertex(&self, other: &Face) -> bool {
        self.corners().any(|a| other.corners().any(|b| a == b))
    }
}

/// A deformable surface or kinematic obstacle as handed over by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Edges as vertex index pairs (unordered).
    pub edges: Vec<[u32; 2]>,
    /// Triangle and quad faces.
    pub faces: Vec<Face>,
}

impl Surface {
    /// Builds a surface from positions and faces, deriving the unique edge set.
    pub fn from_faces(positions: Vec<Vec3>, faces: Vec<Face>) -> DrapeResult<Self> {
        let edges = derive_edges(&faces);
        let surface = Self {
            positions,
            edges,
            faces,
        };
        surface.validate()?;
        Ok(surface)
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns the number of triangles once quads are split.
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|f| if f.is_quad() { 2 } else { 1 }).sum()
    }

    /// Returns the position of vertex `i`.
    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        self.positions[i]
    }

    /// Moves every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Validates surface integrity.
    ///
    /// Checks:
    /// - All edge and face indices are within bounds
    /// - No edge connects a vertex to itself
    /// - No face repeats a corner
    pub fn validate(&self) -> DrapeResult<()> {
        let n = self.positions.len();

        for (i, &[a, b]) in self.edges.iter().enumerate() {
            if a as usize >= n || b as usize >= n {
                return Err(DrapeError::InvalidMesh(format!(
                    "Edge {} references vertex out of range (vertex count: {})",
                    i, n
                )));
            }
            if a == b {
                return Err(DrapeError::InvalidMesh(format!(
                    "Edge {} connects vertex {} to itself",
                    i, a
                )));
            }
        }

        for (i, face) in self.faces.iter().enumerate() {
            let corners: Vec<u32> = face.corners().collect();
            if let Some(&bad) = corners.iter().find(|&&c| c as usize >= n) {
                return Err(DrapeError::InvalidMesh(format!(
                    "Face {} references vertex {} (vertex count: {})",
                    i, bad, n
                )));
            }
            for (k, &c) in corners.iter().enumerate() {
                if corners[k + 1..].contains(&c) {
                    return Err(DrapeError::InvalidMesh(format!(
                        "Face {} has repeated vertex index {}",
                        i, c
                    )));
                }
            }
        }

        Ok(())
    }
}
