//! Cloth simulation state: per-vertex and per-spring data plus the frame cache.
//!
//! This is the primary mutable data structure during simulation. The
//! integrator writes `x`/`xold`; the collision response writes the
//! tentative fields (`tx`, `txold`, `tv`) and the impulse accumulators;
//! [`ClothState::commit`] folds the tentative state back into `x`/`v`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use drape_math::Vec3;
use drape_mesh::{Face, Surface};
use drape_types::error::try_reserve;
use drape_types::{DrapeError, DrapeResult, SpringId};

use crate::cache::{FrameCache, FrameSnapshot, PurgePolicy};
use crate::config::ClothConfig;
use crate::spring::{build_springs, ClothSpring, SpringFlags};

bitflags! {
    /// Per-vertex state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct VertexFlags: u8 {
        /// Held at `xconst`; never integrated and never pushed by collisions.
        const PINNED = 0b0000_0001;
        /// Received a collision impulse during the last frame.
        const COLLIDED = 0b0000_0010;
    }
}

/// A single cloth vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClothVertex {
    /// Position.
    pub x: Vec3,
    /// Position one integrator sub-step ago.
    pub xold: Vec3,
    /// Goal position for pinned vertices.
    pub xconst: Vec3,
    /// Tentative end-of-frame position.
    pub tx: Vec3,
    /// Tentative start-of-frame position.
    pub txold: Vec3,
    /// Tentative displacement over the frame.
    pub tv: Vec3,
    /// Committed displacement over the last frame.
    pub v: Vec3,
    pub mass: f32,
    /// Goal weight in `[0, 1]`.
    pub goal: f32,
    pub flags: VertexFlags,
    /// Impulse accumulated during the current response iteration.
    pub impulse: Vec3,
    /// Number of impulses summed into `impulse`.
    pub impulse_count: u32,
}

impl ClothVertex {
    fn at(position: Vec3, mass: f32) -> Self {
        Self {
            x: position,
            xold: position,
            xconst: position,
            tx: position,
            txold: position,
            tv: Vec3::ZERO,
            v: Vec3::ZERO,
            mass,
            goal: 0.0,
            flags: VertexFlags::empty(),
            impulse: Vec3::ZERO,
            impulse_count: 0,
        }
    }

    /// Returns true if the vertex is held at its goal position.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.flags.contains(VertexFlags::PINNED)
    }
}

/// Live state of one simulated cloth.
#[derive(Debug, Clone)]
pub struct ClothState {
    pub vertices: Vec<ClothVertex>,
    pub springs: Vec<ClothSpring>,
    /// Copy of the surface faces, needed for collision.
    pub faces: Vec<Face>,
    /// Cached snapshots keyed by frame.
    pub cache: FrameCache,
    goal_mode: bool,
    pin_threshold: f32,
}

impl ClothState {
    /// Binds a surface: builds its spring network and vertex array.
    ///
    /// Rest lengths are scaled by `config.world_scale`. All vertices
    /// start at rest, unpinned, with `config.vertex_mass`.
    pub fn bind(surface: &Surface, config: &ClothConfig) -> DrapeResult<Self> {
        config.validate()?;
        surface.validate()?;

        let mut springs = build_springs(surface)?;
        for spring in &mut springs {
            spring.rest_length *= config.world_scale;
        }

        let n = surface.vertex_count();
        let mut vertices = Vec::new();
        try_reserve(&mut vertices, n, "cloth vertices")?;
        vertices.extend(
            surface
                .positions
                .iter()
                .map(|&p| ClothVertex::at(p, config.vertex_mass)),
        );

        let mut faces = Vec::new();
        try_reserve(&mut faces, surface.face_count(), "cloth faces")?;
        faces.extend_from_slice(&surface.faces);

        debug!(
            vertices = n,
            springs = springs.len(),
            faces = faces.len(),
            "bound cloth state"
        );

        Ok(Self {
            vertices,
            springs,
            faces,
            cache: FrameCache::new(),
            goal_mode: config.goal_mode,
            pin_threshold: config.pin_threshold,
        })
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of springs.
    #[inline]
    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    /// Returns true if vertex `i` is pinned.
    #[inline]
    pub fn is_pinned(&self, i: usize) -> bool {
        self.vertices[i].is_pinned()
    }

    fn check_len(&self, len: usize) -> DrapeResult<()> {
        if len != self.vertices.len() {
            return Err(DrapeError::TopologyMismatch {
                expected: self.vertices.len(),
                found: len,
            });
        }
        Ok(())
    }

    /// Sets every vertex's goal weight (clamped to `[0, 1]`) and re-derives pins.
    pub fn set_goal_weights(&mut self, weights: &[f32]) -> DrapeResult<()> {
        self.check_len(weights.len())?;
        for (vertex, &w) in self.vertices.iter_mut().zip(weights) {
            vertex.goal = w.clamp(0.0, 1.0);
        }
        self.refresh_pins();
        Ok(())
    }

    /// Pins vertex `i` at its current goal position (goal weight 1).
    pub fn pin(&mut self, i: usize) -> DrapeResult<()> {
        let count = self.vertices.len();
        let vertex = self
            .vertices
            .get_mut(i)
            .ok_or_else(|| DrapeError::InvalidConfig(format!("cannot pin vertex {i}: cloth has {count} vertices")))?;
        vertex.goal = 1.0;
        self.refresh_pins();
        Ok(())
    }

    fn refresh_pins(&mut self) {
        for vertex in &mut self.vertices {
            let pinned = self.goal_mode && vertex.goal >= self.pin_threshold;
            vertex.flags.set(VertexFlags::PINNED, pinned);
        }
    }

    /// Updates the goal positions pinned vertices are held at.
    pub fn set_goal_positions(&mut self, positions: &[Vec3]) -> DrapeResult<()> {
        self.check_len(positions.len())?;
        for (vertex, &p) in self.vertices.iter_mut().zip(positions) {
            vertex.xconst = p;
        }
        Ok(())
    }

    /// Current positions.
    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.x).collect()
    }

    /// Tentative end-of-frame positions.
    pub fn tentative_positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.tx).collect()
    }

    /// Tentative start-of-frame positions.
    pub fn tentative_start_positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.txold).collect()
    }

    /// Records the start-of-frame position and clears per-frame flags.
    pub fn begin_frame(&mut self) {
        for vertex in &mut self.vertices {
            vertex.txold = vertex.x;
            vertex.flags.remove(VertexFlags::COLLIDED);
            vertex.impulse = Vec3::ZERO;
            vertex.impulse_count = 0;
        }
    }

    /// Loads the integrator's result as the tentative state of the frame.
    pub fn load_tentative(&mut self) {
        for vertex in &mut self.vertices {
            vertex.tx = vertex.x;
            vertex.tv = vertex.x - vertex.txold;
        }
    }

    /// `tx = txold + tv` for every vertex.
    pub fn advance_tentative(&mut self) {
        for vertex in &mut self.vertices {
            vertex.tx = vertex.txold + vertex.tv;
        }
    }

    /// Folds the tentative state into the authoritative state.
    ///
    /// The collision-induced displacement `tx - x` is spread over the
    /// `substeps` integrator sub-steps so the next frame's Verlet motion
    /// carries it.
    pub fn commit(&mut self, substeps: u32) {
        let substeps = substeps.max(1) as f32;
        for vertex in &mut self.vertices {
            let carried = vertex.x - vertex.xold;
            let delta = vertex.tx - vertex.x;
            vertex.x = vertex.tx;
            vertex.xold = vertex.tx - carried - delta / substeps;
            vertex.v = vertex.tv;
        }
    }

    /// Kinetic energy `0.5 * Σ m |v / frame_time|²` of unpinned vertices.
    pub fn kinetic_energy(&self, frame_time: f32) -> f64 {
        let inv = 1.0 / frame_time as f64;
        self.vertices
            .iter()
            .filter(|v| !v.is_pinned())
            .map(|v| {
                let speed2 = (v.v.length_squared() as f64) * inv * inv;
                0.5 * v.mass as f64 * speed2
            })
            .sum()
    }

    /// Current length of `spring`.
    #[inline]
    pub fn spring_length(&self, spring: &ClothSpring) -> f32 {
        self.vertices[spring.i.index()].x.distance(self.vertices[spring.j.index()].x)
    }

    /// Largest relative stretch `|len - rest| / rest` over active springs.
    pub fn max_spring_strain(&self) -> f32 {
        self.springs
            .iter()
            .filter(|s| s.is_active() && s.rest_length > 0.0)
            .map(|s| (self.spring_length(s) - s.rest_length).abs() / s.rest_length)
            .fold(0.0, f32::max)
    }

    /// Tears every active spring stretched beyond `rest * max_stretch`.
    ///
    /// Torn springs are deactivated and skipped by relaxation from then on.
    pub fn tear_springs(&mut self, max_stretch: f32) -> Vec<SpringId> {
        let mut torn = Vec::new();
        for idx in 0..self.springs.len() {
            let spring = self.springs[idx];
            if !spring.is_active() {
                continue;
            }
            if self.spring_length(&spring) > spring.rest_length * max_stretch {
                self.springs[idx].flags |= SpringFlags::TORN | SpringFlags::DEACTIVATED;
                torn.push(SpringId(idx as u32));
            }
        }
        if !torn.is_empty() {
            debug!(count = torn.len(), "tore springs");
        }
        torn
    }

    // ─── Frame cache ──────────────────────────────────────────

    /// Returns true if `frame` is cached.
    pub fn cache_search(&self, frame: i32) -> bool {
        self.cache.search(frame)
    }

    /// Loads the snapshot cached at `frame` into the live state.
    pub fn cache_get(&mut self, frame: i32) -> DrapeResult<()> {
        let snapshot = self.cache.get(frame).ok_or(DrapeError::CacheMiss(frame))?;
        if snapshot.vertices.len() != self.vertices.len() {
            return Err(DrapeError::TopologyMismatch {
                expected: self.vertices.len(),
                found: snapshot.vertices.len(),
            });
        }
        self.vertices.clone_from(&snapshot.vertices);
        self.springs.clone_from(&snapshot.springs);
        trace!(frame, "loaded cached frame");
        Ok(())
    }

    /// Snapshots the live vertex and spring arrays into the cache at `frame`.
    pub fn cache_set(&mut self, frame: i32) {
        let snapshot = FrameSnapshot {
            frame,
            vertices: self.vertices.clone(),
            springs: self.springs.clone(),
        };
        self.cache.set(snapshot);
        trace!(frame, "cached frame");
    }

    /// Drops cached frames according to `policy`.
    pub fn cache_free(&mut self, policy: PurgePolicy) {
        self.cache.free(policy);
    }
}
