//! Damped position-Verlet integrator.
//!
//! Each sub-step of length `h = dt / substeps`:
//!
//! 1. Every unpinned vertex moves by its retained previous motion plus
//!    gravity: `x' = x + (x - xold) * retention + g * h²`. Pinned
//!    vertices are held at `xconst`.
//! 2. Structural and shear springs are projected toward their rest
//!    length `constraint_iterations` times. Each unpinned endpoint takes
//!    half the length error. Bending springs are not projected.

use std::time::Instant;

use drape_math::Vec3;
use drape_types::constants::ALMOST_ZERO;
use drape_types::{DrapeError, DrapeResult};

use crate::config::ClothConfig;
use crate::state::ClothState;
use crate::strategy::{SolverStrategy, StepResult};

/// Damped Verlet integrator with PBD-style spring relaxation.
pub struct DampedVerlet {
    velocity_retention: f32,
    constraint_iterations: u32,
    /// Indices of springs the relaxation pass visits.
    relaxed: Vec<usize>,
    vertex_count: usize,
    initialized: bool,
}

impl DampedVerlet {
    pub fn new() -> Self {
        Self {
            velocity_retention: 1.0,
            constraint_iterations: 0,
            relaxed: Vec::new(),
            vertex_count: 0,
            initialized: false,
        }
    }

    fn integrate(&self, state: &mut ClothState, gravity_step: Vec3) {
        let retention = self.velocity_retention;
        for vertex in &mut state.vertices {
            if vertex.is_pinned() {
                vertex.x = vertex.xconst;
                vertex.xold = vertex.xconst;
                continue;
            }
            let prior = vertex.x;
            vertex.x = prior + (prior - vertex.xold) * retention + gravity_step;
            vertex.xold = prior;
        }
    }

    /// One projection pass. Returns the number of collapsed springs skipped.
    fn relax(&self, state: &mut ClothState) -> u32 {
        let mut skipped = 0;
        for &s in &self.relaxed {
            let spring = state.springs[s];
            if !spring.is_active() {
                continue;
            }
            let (i, j) = (spring.i.index(), spring.j.index());
            let d = state.vertices[j].x - state.vertices[i].x;
            let len = d.length();
            if len < ALMOST_ZERO {
                skipped += 1;
                continue;
            }
            let correction = d * (0.5 * (len - spring.rest_length) / len);
            if !state.vertices[i].is_pinned() {
                state.vertices[i].x += correction;
            }
            if !state.vertices[j].is_pinned() {
                state.vertices[j].x -= correction;
            }
        }
        skipped
    }
}

impl Default for DampedVerlet {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverStrategy for DampedVerlet {
    fn init(&mut self, state: &ClothState, config: &ClothConfig) -> DrapeResult<()> {
        self.velocity_retention = config.velocity_retention;
        self.constraint_iterations = config.constraint_iterations;
        self.relaxed = state
            .springs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_relaxed())
            .map(|(idx, _)| idx)
            .collect();
        self.vertex_count = state.vertex_count();
        self.initialized = true;
        Ok(())
    }

    fn step(
        &mut self,
        state: &mut ClothState,
        dt: f32,
        substeps: u32,
        gravity: Vec3,
    ) -> DrapeResult<StepResult> {
        let start = Instant::now();

        if !self.initialized {
            return Err(DrapeError::SolverNotInitialized(self.name().into()));
        }
        if state.vertex_count() != self.vertex_count {
            return Err(DrapeError::TopologyMismatch {
                expected: self.vertex_count,
                found: state.vertex_count(),
            });
        }

        let substeps = substeps.max(1);
        let h = dt / substeps as f32;
        let gravity_step = gravity * (h * h);

        let mut result = StepResult::default();
        for _ in 0..substeps {
            self.integrate(state, gravity_step);
            for _ in 0..self.constraint_iterations {
                result.skipped_corrections += self.relax(state);
                result.relaxation_passes += 1;
            }
            result.substeps += 1;
        }

        result.wall_time = start.elapsed().as_secs_f64();
        Ok(result)
    }

    fn free(&mut self) {
        self.relaxed = Vec::new();
        self.vertex_count = 0;
        self.initialized = false;
    }

    fn name(&self) -> &str {
        "damped_verlet"
    }
}
