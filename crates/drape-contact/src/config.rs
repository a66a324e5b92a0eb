//! Collision configuration.

use serde::{Deserialize, Serialize};

use drape_math::KdopType;
use drape_types::constants::{CLOTH_MAX_THRESHOLD, DEFAULT_COLLISION_EPSILON, DEFAULT_IMPULSE_ITERATIONS};
use drape_types::{DrapeError, DrapeResult};

/// Parameters for collision detection and response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Whether collision passes run at all.
    pub enabled: bool,

    /// Contact distance; also the inflation of every leaf bound.
    pub epsilon: f32,

    /// Bounding volume shape used by every tree.
    pub kdop: KdopType,

    /// Round cap for each of the static and moving passes.
    pub max_rounds: u32,

    /// Impulse iterations per round.
    pub impulse_iterations: u32,

    /// Friction coefficient. Carried for hosts; the response is frictionless.
    pub friction: f32,

    /// Collide the cloth against itself.
    pub self_collision: bool,

    /// Run leaf refits and contact tests on the rayon pool.
    pub parallel: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            epsilon: DEFAULT_COLLISION_EPSILON,
            kdop: KdopType::default(),
            max_rounds: CLOTH_MAX_THRESHOLD,
            impulse_iterations: DEFAULT_IMPULSE_ITERATIONS,
            friction: 0.0,
            self_collision: false,
            parallel: true,
        }
    }
}

impl CollisionConfig {
    /// Collision switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> DrapeResult<()> {
        if !(self.epsilon > 0.0) {
            return Err(DrapeError::InvalidConfig(format!(
                "collision epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.max_rounds == 0 {
            return Err(DrapeError::InvalidConfig("max_rounds must be at least 1".into()));
        }
        if self.impulse_iterations == 0 {
            return Err(DrapeError::InvalidConfig(
                "impulse_iterations must be at least 1".into(),
            ));
        }
        if self.friction < 0.0 {
            return Err(DrapeError::InvalidConfig(format!(
                "friction must be non-negative, got {}",
                self.friction
            )));
        }
        Ok(())
    }
}
