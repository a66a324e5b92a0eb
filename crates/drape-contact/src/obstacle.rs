//! Kinematic obstacles.
//!
//! An obstacle is a surface whose positions the host drives every frame.
//! It keeps the previous and current position snapshots so the moving
//! pass can bound its sweep, and owns its own bounding volume tree.

use drape_math::Vec3;
use drape_mesh::{Face, Surface};
use drape_types::{DrapeError, DrapeResult};

use crate::bvh::BoundingVolumeTree;
use crate::config::CollisionConfig;

/// A kinematic collision surface.
#[derive(Debug, Clone)]
pub struct Obstacle {
    faces: Vec<Face>,
    prev: Vec<Vec3>,
    cur: Vec<Vec3>,
    tree: BoundingVolumeTree,
}

impl Obstacle {
    /// Creates an obstacle resting at the surface's positions.
    pub fn new(surface: &Surface, config: &CollisionConfig) -> DrapeResult<Self> {
        surface.validate()?;
        let tree = BoundingVolumeTree::build_static(&surface.faces, &surface.positions, config.kdop, config.epsilon)?
            .with_parallel(config.parallel);
        Ok(Self {
            faces: surface.faces.clone(),
            prev: surface.positions.clone(),
            cur: surface.positions.clone(),
            tree,
        })
    }

    /// Moves the obstacle to `positions` for the next frame.
    ///
    /// The current snapshot becomes the previous one.
    pub fn advance(&mut self, positions: &[Vec3]) -> DrapeResult<()> {
        if positions.len() != self.cur.len() {
            return Err(DrapeError::TopologyMismatch {
                expected: self.cur.len(),
                found: positions.len(),
            });
        }
        std::mem::swap(&mut self.prev, &mut self.cur);
        self.cur.copy_from_slice(positions);
        Ok(())
    }

    /// Holds the obstacle still: previous snapshot = current.
    pub fn settle(&mut self) {
        self.prev.copy_from_slice(&self.cur);
    }

    /// Translates the obstacle by `offset` for the next frame.
    pub fn translate(&mut self, offset: Vec3) {
        std::mem::swap(&mut self.prev, &mut self.cur);
        for (c, p) in self.cur.iter_mut().zip(&self.prev) {
            *c = *p + offset;
        }
    }

    /// Refits the tree to the start-of-frame snapshot.
    pub fn update_static(&mut self) -> DrapeResult<()> {
        self.tree.update(&self.prev, &self.prev, false)
    }

    /// Refits the tree to the sweep over the frame.
    pub fn update_moving(&mut self) -> DrapeResult<()> {
        self.tree.update(&self.prev, &self.cur, true)
    }

    /// Displacement of vertex `i` over the frame.
    #[inline]
    pub fn velocity(&self, i: usize) -> Vec3 {
        self.cur[i] - self.prev[i]
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn prev_positions(&self) -> &[Vec3] {
        &self.prev
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.cur
    }

    pub fn tree(&self) -> &BoundingVolumeTree {
        &self.tree
    }

    pub fn vertex_count(&self) -> usize {
        self.cur.len()
    }
}
