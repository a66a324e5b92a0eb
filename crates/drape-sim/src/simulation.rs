//! Cloth simulation driver.
//!
//! [`ClothSimulation`] owns one cloth, its bounding volume tree, the
//! integrator, the obstacles and the collision orchestrator, and runs
//! them in order once per frame:
//!
//! ```text
//! begin_frame → integrate → load tentative → collide (static, advance, moving) → commit → cache
//! ```

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use drape_contact::{BoundingVolumeTree, CollisionOrchestrator, CollisionPass, CollisionReport, Obstacle};
use drape_math::Vec3;
use drape_mesh::normals::vertex_normals;
use drape_mesh::Surface;
use drape_solver::{ClothState, PurgePolicy, SolverStrategy, StepResult};
use drape_telemetry::{EventBus, EventKind, PassKind, SimulationEvent};
use drape_types::{DrapeError, DrapeResult, SpringId};

use crate::config::SimulationConfig;

/// What happened during one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: i32,
    pub substeps: u32,
    pub relaxation_passes: u32,
    pub collision: CollisionReport,
    pub kinetic_energy: f64,
    pub max_strain: f32,
    pub torn_springs: u32,
    /// Wall-clock time for the frame (seconds).
    pub wall_time: f64,
}

/// Per-surface simulation pipeline.
pub struct ClothSimulation {
    config: SimulationConfig,
    state: ClothState,
    tree: BoundingVolumeTree,
    solver: Box<dyn SolverStrategy>,
    orchestrator: CollisionOrchestrator,
    obstacles: Vec<Obstacle>,
    bus: Option<EventBus>,
    frame: i32,
}

/// Builds the per-surface pieces. Nothing is replaced until all succeed.
fn bind_surface(
    surface: &Surface,
    config: &SimulationConfig,
) -> DrapeResult<(ClothState, BoundingVolumeTree, Box<dyn SolverStrategy>)> {
    let state = ClothState::bind(surface, &config.cloth)?;
    let tree = BoundingVolumeTree::build_static(
        &surface.faces,
        &surface.positions,
        config.collision.kdop,
        config.collision.epsilon,
    )?
    .with_parallel(config.collision.parallel);
    let mut solver = config.cloth.solver.create();
    solver.init(&state, &config.cloth)?;
    Ok((state, tree, solver))
}

impl ClothSimulation {
    /// Binds `surface` as a cloth at frame 0.
    pub fn new(surface: &Surface, config: SimulationConfig) -> DrapeResult<Self> {
        config.validate()?;
        let (state, tree, solver) = bind_surface(surface, &config)?;
        let orchestrator = CollisionOrchestrator::new(config.collision.clone())?;
        info!(
            vertices = state.vertex_count(),
            springs = state.spring_count(),
            solver = solver.name(),
            "cloth simulation ready"
        );
        Ok(Self {
            config,
            state,
            tree,
            solver,
            orchestrator,
            obstacles: Vec::new(),
            bus: None,
            frame: 0,
        })
    }

    /// Sends per-frame events into `bus`.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn bus_mut(&mut self) -> Option<&mut EventBus> {
        self.bus.as_mut()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &ClothState {
        &self.state
    }

    /// Mutable access for goal weights, goal positions and pins.
    pub fn state_mut(&mut self) -> &mut ClothState {
        &mut self.state
    }

    pub fn tree(&self) -> &BoundingVolumeTree {
        &self.tree
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Last simulated or restored frame.
    pub fn current_frame(&self) -> i32 {
        self.frame
    }

    /// Current cloth positions.
    pub fn positions(&self) -> Vec<Vec3> {
        self.state.positions()
    }

    /// Area-weighted vertex normals at the current positions.
    pub fn normals(&self) -> Vec<Vec3> {
        vertex_normals(&self.state.faces, &self.state.positions())
    }

    /// Adds a kinematic obstacle resting at `surface`'s positions. Returns its index.
    pub fn add_obstacle(&mut self, surface: &Surface) -> DrapeResult<usize> {
        self.obstacles.push(Obstacle::new(surface, &self.config.collision)?);
        Ok(self.obstacles.len() - 1)
    }

    /// Moves obstacle `index` to `positions` for the next frame.
    pub fn move_obstacle(&mut self, index: usize, positions: &[Vec3]) -> DrapeResult<()> {
        let count = self.obstacles.len();
        self.obstacles
            .get_mut(index)
            .ok_or_else(|| DrapeError::InvalidConfig(format!("no obstacle {index} (have {count})")))?
            .advance(positions)
    }

    /// Rebinds the cloth if `surface`'s topology no longer matches.
    ///
    /// A changed vertex or face count frees the cache and rebuilds state,
    /// springs, tree and integrator data from scratch. Returns true if a
    /// rebuild happened. On failure the previous state is kept.
    pub fn sync_surface(&mut self, surface: &Surface) -> DrapeResult<bool> {
        if surface.vertex_count() == self.state.vertex_count() && surface.face_count() == self.state.faces.len() {
            return Ok(false);
        }

        let (state, tree, solver) = bind_surface(surface, &self.config)?;
        let old_vertices = self.state.vertex_count();
        self.state.cache_free(PurgePolicy::All);
        self.solver.free();
        self.state = state;
        self.tree = tree;
        self.solver = solver;

        debug!(old_vertices, vertices = self.state.vertex_count(), "rebuilt cloth after topology change");
        self.emit(self.frame, EventKind::Rebuild {
            vertices: self.state.vertex_count() as u32,
            springs: self.state.spring_count() as u32,
            faces: self.state.faces.len() as u32,
        });
        self.flush();
        Ok(true)
    }

    /// Loads the cached snapshot of `frame` into the live state.
    pub fn restore_frame(&mut self, frame: i32) -> DrapeResult<()> {
        self.state.cache_get(frame)?;
        self.frame = frame;
        Ok(())
    }

    /// Simulates the next frame.
    pub fn step_frame(&mut self) -> DrapeResult<FrameReport> {
        let start = Instant::now();
        let frame = self.frame + 1;
        let cloth = &self.config.cloth;
        let substeps = cloth.steps_per_frame;
        let gravity = Vec3::from(cloth.gravity);

        self.emit(frame, EventKind::FrameBegin {
            sim_time: self.frame as f64 * cloth.frame_time as f64,
        });

        self.state.begin_frame();
        let step: StepResult = self.solver.step(&mut self.state, cloth.frame_time, substeps, gravity)?;
        self.emit(frame, EventKind::IntegratorStep {
            substeps: step.substeps,
            relaxation_passes: step.relaxation_passes,
            skipped_corrections: step.skipped_corrections,
        });

        self.state.load_tentative();
        let collision = self
            .orchestrator
            .run(&mut self.state, &mut self.tree, &mut self.obstacles, frame, substeps)?;
        for obstacle in &mut self.obstacles {
            obstacle.settle();
        }
        self.frame = frame;

        for round in &collision.rounds {
            self.emit(frame, EventKind::CollisionRound {
                pass: match round.pass {
                    CollisionPass::Static => PassKind::Static,
                    CollisionPass::Moving => PassKind::Moving,
                },
                round: round.round,
                pairs: round.pairs,
                impulses: round.impulses,
            });
        }
        if !collision.rounds.is_empty() {
            self.emit(frame, EventKind::Convergence {
                static_rounds: collision.static_pass.rounds,
                moving_rounds: collision.moving_pass.rounds,
                converged: collision.converged(),
            });
        }
        self.emit(frame, EventKind::CacheWrite {
            cached_frames: self.state.cache.len() as u32,
        });

        let torn: Vec<SpringId> = match self.config.tear_limit {
            Some(limit) => self.state.tear_springs(limit),
            None => Vec::new(),
        };
        if !torn.is_empty() {
            self.state.cache_set(frame);
            self.emit(frame, EventKind::SpringsTorn {
                count: torn.len() as u32,
            });
        }

        let kinetic_energy = self.state.kinetic_energy(self.config.cloth.frame_time);
        let max_strain = self.state.max_spring_strain();
        self.emit(frame, EventKind::Energy {
            kinetic: kinetic_energy,
            max_strain,
        });

        let wall_time = start.elapsed().as_secs_f64();
        self.emit(frame, EventKind::FrameEnd { wall_time });
        self.flush();

        Ok(FrameReport {
            frame,
            substeps: step.substeps,
            relaxation_passes: step.relaxation_passes,
            collision,
            kinetic_energy,
            max_strain,
            torn_springs: torn.len() as u32,
            wall_time,
        })
    }

    fn emit(&self, frame: i32, kind: EventKind) {
        if let Some(bus) = &self.bus {
            bus.emit(SimulationEvent::new(frame, kind));
        }
    }

    fn flush(&mut self) {
        if let Some(bus) = &mut self.bus {
            let dispatched = bus.flush();
            trace!(dispatched, "flushed frame events");
        }
    }
}

impl Drop for ClothSimulation {
    fn drop(&mut self) {
        if let Some(bus) = &mut self.bus {
            bus.shutdown();
        }
    }
}
