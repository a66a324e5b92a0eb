//! Cloth configuration.
//!
//! Parameters that control time integration, pinning and spring setup.

use serde::{Deserialize, Serialize};

use drape_types::constants::{
    DEFAULT_CONSTRAINT_ITERATIONS, DEFAULT_FRAME_TIME, DEFAULT_PIN_THRESHOLD,
    DEFAULT_STEPS_PER_FRAME, DEFAULT_VELOCITY_RETENTION, GRAVITY,
};
use drape_types::{DrapeError, DrapeResult};

use crate::strategy::SolverKind;

/// Configuration for cloth integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothConfig {
    /// Which integrator to run.
    pub solver: SolverKind,

    /// Gravity vector [gx, gy, gz] in m/s².
    pub gravity: [f32; 3],

    /// Duration of one output frame (seconds).
    pub frame_time: f32,

    /// Integrator sub-steps per output frame.
    pub steps_per_frame: u32,

    /// Spring relaxation passes per sub-step.
    pub constraint_iterations: u32,

    /// Fraction of last sub-step's motion carried into the next (damped Verlet).
    pub velocity_retention: f32,

    /// Structural spring stiffness. Read by force-based schemes; damped
    /// Verlet projects lengths directly.
    pub structural_stiffness: f32,

    /// Bending spring stiffness. Read by force-based schemes.
    pub bending_stiffness: f32,

    /// Spring damping coefficient. Read by force-based schemes.
    pub spring_damping: f32,

    /// Per-vertex mass (kg).
    pub vertex_mass: f32,

    /// Whether goal weights pin vertices.
    pub goal_mode: bool,

    /// Goal weight at or above which a vertex is pinned.
    pub pin_threshold: f32,

    /// Scale applied to bind-pose rest lengths to bring them into world units.
    pub world_scale: f32,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            solver: SolverKind::DampedVerlet,
            gravity: [0.0, -GRAVITY, 0.0],
            frame_time: DEFAULT_FRAME_TIME,
            steps_per_frame: DEFAULT_STEPS_PER_FRAME,
            constraint_iterations: DEFAULT_CONSTRAINT_ITERATIONS,
            velocity_retention: DEFAULT_VELOCITY_RETENTION,
            structural_stiffness: 15.0,
            bending_stiffness: 0.5,
            spring_damping: 5.0,
            vertex_mass: 1.0,
            goal_mode: true,
            pin_threshold: DEFAULT_PIN_THRESHOLD,
            world_scale: 1.0,
        }
    }
}

impl ClothConfig {
    /// Creates a config for debugging (one sub-step, one relaxation pass).
    pub fn debug() -> Self {
        Self {
            steps_per_frame: 1,
            constraint_iterations: 1,
            ..Default::default()
        }
    }

    /// Creates a high-quality config (more sub-steps and relaxation passes).
    pub fn high_quality() -> Self {
        Self {
            steps_per_frame: 10,
            constraint_iterations: 12,
            ..Default::default()
        }
    }

    /// Duration of one integrator sub-step.
    pub fn substep_time(&self) -> f32 {
        self.frame_time / self.steps_per_frame.max(1) as f32
    }

    /// Checks every parameter against its valid range.
    pub fn validate(&self) -> DrapeResult<()> {
        if self.steps_per_frame == 0 {
            return Err(DrapeError::InvalidConfig("steps_per_frame must be at least 1".into()));
        }
        if !(self.frame_time > 0.0) {
            return Err(DrapeError::InvalidConfig(format!(
                "frame_time must be positive, got {}",
                self.frame_time
            )));
        }
        if !(0.0..=1.0).contains(&self.velocity_retention) {
            return Err(DrapeError::InvalidConfig(format!(
                "velocity_retention must lie in [0, 1], got {}",
                self.velocity_retention
            )));
        }
        if !(0.0..=1.0).contains(&self.pin_threshold) {
            return Err(DrapeError::InvalidConfig(format!(
                "pin_threshold must lie in [0, 1], got {}",
                self.pin_threshold
            )));
        }
        if !(self.vertex_mass > 0.0) {
            return Err(DrapeError::InvalidConfig(format!(
                "vertex_mass must be positive, got {}",
                self.vertex_mass
            )));
        }
        if !(self.world_scale > 0.0) {
            return Err(DrapeError::InvalidConfig(format!(
                "world_scale must be positive, got {}",
                self.world_scale
            )));
        }
        Ok(())
    }
}
