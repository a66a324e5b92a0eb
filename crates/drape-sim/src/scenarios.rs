//! Canonical scenarios: a procedural cloth, its pins, optional obstacle and config.
//!
//! 1. **Hanging sheet**: cloth pinned along one edge, swinging down under gravity
//! 2. **Sphere drape**: free cloth falling onto a sphere
//! 3. **Self fold**: cloth pinned at two corners, folding onto itself

use serde::{Deserialize, Serialize};

use drape_math::Vec3;
use drape_mesh::generators::{quad_grid, uv_sphere};
use drape_mesh::Surface;
use drape_types::DrapeResult;

use crate::config::SimulationConfig;
use crate::simulation::ClothSimulation;

/// Which scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    HangingSheet,
    SphereDrape,
    SelfFold,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::HangingSheet,
            ScenarioKind::SphereDrape,
            ScenarioKind::SelfFold,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::HangingSheet => "hanging_sheet",
            ScenarioKind::SphereDrape => "sphere_drape",
            ScenarioKind::SelfFold => "self_fold",
        }
    }

    /// Parses a scenario from its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.name() == name)
    }
}

/// A fully specified scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub cloth: Surface,
    /// Static obstacle, if any.
    pub obstacle: Option<Surface>,
    /// Indices of pinned cloth vertices.
    pub pinned: Vec<usize>,
    pub config: SimulationConfig,
    pub frames: u32,
}

impl Scenario {
    /// A 1m × 1m sheet at `cols × rows` resolution, lying flat at `y = 1`
    /// and pinned along its `z = -0.5` edge.
    pub fn hanging_sheet(cols: usize, rows: usize) -> Self {
        let mut cloth = quad_grid(cols, rows, 1.0, 1.0);
        cloth.translate(Vec3::new(0.0, 1.0, 0.0));

        Self {
            kind: ScenarioKind::HangingSheet,
            cloth,
            obstacle: None,
            pinned: (0..=cols).collect(),
            config: SimulationConfig::default(),
            frames: 50,
        }
    }

    /// A 1.5m × 1.5m sheet released just above a 0.3m sphere at the origin.
    pub fn sphere_drape(cols: usize, rows: usize) -> Self {
        let radius = 0.3;
        let mut cloth = quad_grid(cols, rows, 1.5, 1.5);
        cloth.translate(Vec3::new(0.0, radius + 0.05, 0.0));

        Self {
            kind: ScenarioKind::SphereDrape,
            cloth,
            obstacle: Some(uv_sphere(Vec3::ZERO, radius, 16, 32)),
            pinned: Vec::new(),
            config: SimulationConfig::default(),
            frames: 75,
        }
    }

    /// A 1m × 0.5m sheet pinned at the two corners of one long edge,
    /// sagging into itself with self-collision enabled.
    pub fn self_fold(cols: usize, rows: usize) -> Self {
        let mut cloth = quad_grid(cols, rows, 1.0, 0.5);
        cloth.translate(Vec3::new(0.0, 1.0, 0.0));

        let mut config = SimulationConfig::default();
        config.collision.self_collision = true;

        Self {
            kind: ScenarioKind::SelfFold,
            cloth,
            obstacle: None,
            pinned: vec![0, cols],
            config,
            frames: 50,
        }
    }

    /// The default-resolution scenario of `kind`.
    pub fn from_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::HangingSheet => Self::hanging_sheet(20, 20),
            ScenarioKind::SphereDrape => Self::sphere_drape(20, 20),
            ScenarioKind::SelfFold => Self::self_fold(20, 10),
        }
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    /// Binds the cloth, pins and obstacle into a ready simulation.
    pub fn build(&self) -> DrapeResult<ClothSimulation> {
        let mut sim = ClothSimulation::new(&self.cloth, self.config.clone())?;
        for &i in &self.pinned {
            sim.state_mut().pin(i)?;
        }
        if let Some(obstacle) = &self.obstacle {
            sim.add_obstacle(obstacle)?;
        }
        Ok(sim)
    }
}
