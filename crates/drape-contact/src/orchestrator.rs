//! Per-frame collision state machine.
//!
//! ```text
//! Idle → StaticPass → AdvanceTentative → MovingPass → Commit → Idle
//! ```
//!
//! The static pass collides the start-of-frame cloth against the
//! start-of-frame obstacles and corrects `tv`. The tentative positions
//! are then advanced, and the moving pass collides them against trees
//! swept over the frame, re-advancing after every round that fired.
//! Each pass stops after `max_rounds` rounds or the first round that
//! fires nothing. Hitting the cap is not an error: the frame commits
//! whatever state exists and the report says it did not converge.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use drape_solver::state::ClothState;
use drape_types::DrapeResult;

use crate::broad::collect_pairs;
use crate::bvh::BoundingVolumeTree;
use crate::config::CollisionConfig;
use crate::narrow::{detect, CollisionPair, ContactSide, ContactSource};
use crate::obstacle::Obstacle;
use crate::response::{ContactResponse, ImpulseResponse};

/// Orchestrator state. `Idle` is both entry and exit of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrchestratorState {
    #[default]
    Idle,
    StaticPass,
    AdvanceTentative,
    MovingPass,
    Commit,
}

/// Which collision pass a round belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPass {
    Static,
    Moving,
}

impl CollisionPass {
    pub fn name(self) -> &'static str {
        match self {
            CollisionPass::Static => "static",
            CollisionPass::Moving => "moving",
        }
    }
}

/// Outcome of one detect-and-respond round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub pass: CollisionPass,
    /// 1-based round number within the pass.
    pub round: u32,
    /// Contacts found this round.
    pub pairs: u32,
    /// Per-vertex impulses applied this round.
    pub impulses: u32,
}

/// Summary of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub rounds: u32,
    pub pairs: u32,
    pub impulses: u32,
    /// A round fired nothing before the cap.
    pub converged: bool,
}

/// Summary of one frame's collision handling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionReport {
    pub static_pass: PassReport,
    pub moving_pass: PassReport,
    /// Every round in execution order.
    pub rounds: Vec<RoundRecord>,
}

impl CollisionReport {
    /// Both passes converged (trivially true when collision is disabled).
    pub fn converged(&self) -> bool {
        self.rounds.is_empty() || (self.static_pass.converged && self.moving_pass.converged)
    }

    pub fn total_pairs(&self) -> u32 {
        self.static_pass.pairs + self.moving_pass.pairs
    }

    pub fn total_impulses(&self) -> u32 {
        self.static_pass.impulses + self.moving_pass.impulses
    }
}

/// Drives collision detection and response for one cloth.
pub struct CollisionOrchestrator {
    config: CollisionConfig,
    response: Box<dyn ContactResponse>,
    state: OrchestratorState,
}

impl CollisionOrchestrator {
    /// Creates an orchestrator with the impulse response.
    pub fn new(config: CollisionConfig) -> DrapeResult<Self> {
        config.validate()?;
        let response = Box::new(ImpulseResponse::new(config.impulse_iterations));
        Ok(Self {
            config,
            response,
            state: OrchestratorState::Idle,
        })
    }

    /// Replaces the contact response.
    pub fn with_response(mut self, response: Box<dyn ContactResponse>) -> Self {
        self.response = response;
        self
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn response_name(&self) -> &str {
        self.response.name()
    }

    /// Runs the collision passes for one frame and commits the result.
    ///
    /// Expects `cloth` to hold the integrator's result as its tentative
    /// state ([`ClothState::load_tentative`]). On return the cloth has
    /// been committed and cached at `frame`.
    pub fn run(
        &mut self,
        cloth: &mut ClothState,
        cloth_tree: &mut BoundingVolumeTree,
        obstacles: &mut [Obstacle],
        frame: i32,
        substeps: u32,
    ) -> DrapeResult<CollisionReport> {
        let mut report = CollisionReport::default();

        if self.config.enabled {
            self.state = OrchestratorState::StaticPass;
            let start = cloth.tentative_start_positions();
            cloth_tree.update(&start, &start, false)?;
            for obstacle in obstacles.iter_mut() {
                obstacle.update_static()?;
            }
            report.static_pass = self.run_pass(CollisionPass::Static, cloth, cloth_tree, obstacles, &mut report.rounds)?;
        }

        self.state = OrchestratorState::AdvanceTentative;
        cloth.advance_tentative();

        if self.config.enabled {
            self.state = OrchestratorState::MovingPass;
            cloth_tree.update(&cloth.tentative_start_positions(), &cloth.tentative_positions(), true)?;
            for obstacle in obstacles.iter_mut() {
                obstacle.update_moving()?;
            }
            report.moving_pass = self.run_pass(CollisionPass::Moving, cloth, cloth_tree, obstacles, &mut report.rounds)?;
        }

        self.state = OrchestratorState::Commit;
        cloth.commit(substeps);
        cloth.cache_set(frame);

        self.state = OrchestratorState::Idle;
        debug!(
            frame,
            pairs = report.total_pairs(),
            impulses = report.total_impulses(),
            converged = report.converged(),
            "collision frame done"
        );
        Ok(report)
    }

    fn gather(&self, pass: CollisionPass, cloth: &ClothState, cloth_tree: &BoundingVolumeTree, obstacles: &[Obstacle]) -> Vec<CollisionPair> {
        let positions = match pass {
            CollisionPass::Static => cloth.tentative_start_positions(),
            CollisionPass::Moving => cloth.tentative_positions(),
        };
        let cloth_side = ContactSide::new(&cloth.faces, &positions);
        let (epsilon, parallel) = (self.config.epsilon, self.config.parallel);

        let mut pairs = Vec::new();
        for (k, obstacle) in obstacles.iter().enumerate() {
            let candidates = collect_pairs(cloth_tree, obstacle.tree(), false);
            if candidates.is_empty() {
                continue;
            }
            let obstacle_positions = match pass {
                CollisionPass::Static => obstacle.prev_positions(),
                CollisionPass::Moving => obstacle.positions(),
            };
            let obstacle_side = ContactSide::new(obstacle.faces(), obstacle_positions);
            pairs.extend(detect(&candidates, cloth_side, obstacle_side, ContactSource::Obstacle(k), epsilon, parallel));
        }
        if self.config.self_collision {
            let candidates = collect_pairs(cloth_tree, cloth_tree, true);
            pairs.extend(detect(&candidates, cloth_side, cloth_side, ContactSource::SelfCloth, epsilon, parallel));
        }
        pairs
    }

    fn run_pass(
        &self,
        pass: CollisionPass,
        cloth: &mut ClothState,
        cloth_tree: &mut BoundingVolumeTree,
        obstacles: &[Obstacle],
        rounds: &mut Vec<RoundRecord>,
    ) -> DrapeResult<PassReport> {
        let mut report = PassReport::default();

        for round in 1..=self.config.max_rounds {
            let pairs = self.gather(pass, cloth, cloth_tree, obstacles);
            let result = self.response.resolve(&pairs, cloth, obstacles);

            report.rounds = round;
            report.pairs += pairs.len() as u32;
            report.impulses += result.impulses;
            rounds.push(RoundRecord {
                pass,
                round,
                pairs: pairs.len() as u32,
                impulses: result.impulses,
            });
            trace!(pass = pass.name(), round, pairs = pairs.len(), impulses = result.impulses, "collision round");

            if !result.fired() {
                report.converged = true;
                break;
            }
            if pass == CollisionPass::Moving {
                cloth.advance_tentative();
                cloth_tree.update(&cloth.tentative_start_positions(), &cloth.tentative_positions(), true)?;
            }
        }

        if !report.converged {
            warn!(pass = pass.name(), rounds = report.rounds, "collision round cap reached");
        }
        Ok(report)
    }
}
