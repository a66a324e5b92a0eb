//! Spring network construction.
//!
//! Derives structural, shear and bending springs from surface topology:
//!
//! 1. **Structural**: one per surface edge.
//! 2. **Shear**: both diagonals of every quad. A triangle's diagonals
//!    coincide with its edges, so triangles contribute none.
//! 3. **Bending**: for each shear spring `(a, b)`, every other shear
//!    spring `(b, c)` leaving `b` proposes a spring `(a, c)`, skipping
//!    `a == c` and pairs already proposed.
//!
//! Rest lengths are bind-pose distances.

use std::collections::HashSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::debug;

use drape_math::Vec3;
use drape_mesh::Surface;
use drape_types::error::try_reserve;
use drape_types::{DrapeError, DrapeResult, VertexId};

/// Topological category of a spring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpringKind {
    /// Along a surface edge.
    Structural,
    /// Across a quad diagonal.
    Shear,
    /// Between second neighbours along diagonal chains.
    Bending,
}

bitflags! {
    /// Per-spring state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SpringFlags: u8 {
        /// Ignored by relaxation.
        const DEACTIVATED = 0b0000_0001;
        /// Stretched past its tear limit.
        const TORN = 0b0000_0010;
    }
}

/// A spring between two cloth vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClothSpring {
    pub i: VertexId,
    pub j: VertexId,
    pub rest_length: f32,
    pub kind: SpringKind,
    pub flags: SpringFlags,
}

impl ClothSpring {
    fn new(i: u32, j: u32, positions: &[Vec3], kind: SpringKind) -> Self {
        Self {
            i: VertexId(i),
            j: VertexId(j),
            rest_length: positions[i as usize].distance(positions[j as usize]),
            kind,
            flags: SpringFlags::empty(),
        }
    }

    /// Returns true unless the spring has been switched off.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.flags.contains(SpringFlags::DEACTIVATED)
    }

    /// Structural and shear springs are projected by the Verlet relaxation.
    #[inline]
    pub fn is_relaxed(&self) -> bool {
        matches!(self.kind, SpringKind::Structural | SpringKind::Shear)
    }

    /// The endpoint opposite `v`.
    #[inline]
    pub fn other(&self, v: u32) -> u32 {
        if self.i.0 == v {
            self.j.0
        } else {
            self.i.0
        }
    }
}

#[inline]
fn unordered(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Builds the full spring network of `surface`.
///
/// Fails with [`DrapeError::NoEdges`] on an edgeless surface and with
/// [`DrapeError::Allocation`] if the spring array cannot be reserved.
pub fn build_springs(surface: &Surface) -> DrapeResult<Vec<ClothSpring>> {
    if surface.edges.is_empty() {
        return Err(DrapeError::NoEdges);
    }

    let positions = &surface.positions;
    let bound = surface.edge_count() + 2 * surface.face_count() + 6 * surface.vertex_count();
    let mut springs: Vec<ClothSpring> = Vec::new();
    try_reserve(&mut springs, bound, "springs")?;

    // Structural
    for &[a, b] in &surface.edges {
        springs.push(ClothSpring::new(a, b, positions, SpringKind::Structural));
    }
    let structural = springs.len();

    // Shear, recording which shear springs touch each vertex.
    let mut shear_at: Vec<Vec<usize>> = vec![Vec::new(); surface.vertex_count()];
    for face in &surface.faces {
        let Some(v4) = face.v4 else {
            continue;
        };
        let [v1, v2, v3] = face.v;
        for (a, b) in [(v1, v3), (v2, v4)] {
            let idx = springs.len();
            springs.push(ClothSpring::new(a, b, positions, SpringKind::Shear));
            shear_at[a as usize].push(idx);
            shear_at[b as usize].push(idx);
        }
    }
    let shear_end = springs.len();

    // Bending
    let mut bending_pairs: HashSet<(u32, u32)> = HashSet::new();
    for s in structural..shear_end {
        let (a, b) = (springs[s].i.0, springs[s].j.0);
        for &t in &shear_at[b as usize] {
            if t == s {
                continue;
            }
            let c = springs[t].other(b);
            if c == a || !bending_pairs.insert(unordered(a, c)) {
                continue;
            }
            springs.push(ClothSpring::new(a, c, positions, SpringKind::Bending));
        }
    }

    springs.shrink_to_fit();
    debug!(
        structural,
        shear = shear_end - structural,
        bending = springs.len() - shear_end,
        "built spring network"
    );
    Ok(springs)
}
