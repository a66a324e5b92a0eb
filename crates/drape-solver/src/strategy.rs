//! Solver strategy trait: the core abstraction for time integration.
//!
//! Every integrator implements this trait, so the simulation pipeline
//! can swap numerical schemes at runtime through [`SolverKind`].

use serde::{Deserialize, Serialize};

use drape_math::Vec3;
use drape_types::DrapeResult;

use crate::config::ClothConfig;
use crate::state::ClothState;
use crate::verlet::DampedVerlet;

/// Result of advancing one output frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    /// Integrator sub-steps performed.
    pub substeps: u32,
    /// Spring relaxation passes performed, summed over sub-steps.
    pub relaxation_passes: u32,
    /// Spring corrections skipped because the spring had collapsed.
    pub skipped_corrections: u32,
    /// Wall-clock time for this step (seconds).
    pub wall_time: f64,
}

/// Trait for time integration schemes.
///
/// The simulation pipeline calls these methods in order:
///
/// ```text
/// solver.init(state, config)?;
/// loop {
///     solver.step(state, frame_time, substeps, gravity)?;
/// }
/// solver.free();
/// ```
pub trait SolverStrategy: Send {
    /// Prepares solver-only data for `state`.
    ///
    /// Idempotent; called again after the state is rebuilt.
    fn init(&mut self, state: &ClothState, config: &ClothConfig) -> DrapeResult<()>;

    /// Advances `state` by one output frame of duration `dt`, split into
    /// `substeps` integrator sub-steps.
    ///
    /// Writes `x` and `xold` of every vertex.
    fn step(
        &mut self,
        state: &mut ClothState,
        dt: f32,
        substeps: u32,
        gravity: Vec3,
    ) -> DrapeResult<StepResult>;

    /// Releases solver-only data. `step` fails until `init` is called again.
    fn free(&mut self);

    /// Returns the solver's name.
    fn name(&self) -> &str;
}

/// Registry of available integrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Position Verlet with velocity retention and spring relaxation.
    #[default]
    DampedVerlet,
}

impl SolverKind {
    /// Instantiates the integrator.
    pub fn create(self) -> Box<dyn SolverStrategy> {
        match self {
            SolverKind::DampedVerlet => Box::new(DampedVerlet::new()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SolverKind::DampedVerlet => "damped_verlet",
        }
    }
}
