//! Simulation event types.
//!
//! Structured events emitted by the simulation at each stage of a frame.
//! Events are lightweight value types that carry just enough data to be
//! useful for monitoring and debugging.

use serde::{Deserialize, Serialize};

/// A simulation event, tagged with the frame it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub frame: i32,
    pub kind: EventKind,
}

/// Collision pass a round event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    Static,
    Moving,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Frame started.
    FrameBegin {
        /// Simulation time at the start of the frame (seconds).
        sim_time: f64,
    },

    /// Frame committed.
    FrameEnd {
        /// Wall-clock time for the entire frame (seconds).
        wall_time: f64,
    },

    /// Integrator finished its sub-steps.
    IntegratorStep {
        substeps: u32,
        relaxation_passes: u32,
        /// Spring corrections skipped because the spring had collapsed.
        skipped_corrections: u32,
    },

    /// One collision detect-and-respond round.
    CollisionRound {
        pass: PassKind,
        round: u32,
        pairs: u32,
        impulses: u32,
    },

    /// Collision convergence report for the frame.
    Convergence {
        static_rounds: u32,
        moving_rounds: u32,
        /// Both passes stopped before the round cap.
        converged: bool,
    },

    /// State summary after commit.
    Energy {
        kinetic: f64,
        /// Largest relative spring stretch.
        max_strain: f32,
    },

    /// Springs torn this frame.
    SpringsTorn { count: u32 },

    /// Frame snapshot stored.
    CacheWrite {
        /// Frames held after the write.
        cached_frames: u32,
    },

    /// Cloth state rebuilt after a topology change.
    Rebuild {
        vertices: u32,
        springs: u32,
        faces: u32,
    },
}

impl SimulationEvent {
    /// Creates a new event for the given frame.
    pub fn new(frame: i32, kind: EventKind) -> Self {
        Self { frame, kind }
    }
}
