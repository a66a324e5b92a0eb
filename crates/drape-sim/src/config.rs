//! Top-level simulation configuration.

use serde::{Deserialize, Serialize};

use drape_contact::CollisionConfig;
use drape_solver::ClothConfig;
use drape_types::{DrapeError, DrapeResult};

/// Everything needed to run a cloth simulation, as loaded from a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub cloth: ClothConfig,
    pub collision: CollisionConfig,
    /// Springs stretched beyond `rest * tear_limit` tear. `None` disables tearing.
    pub tear_limit: Option<f32>,
}

impl SimulationConfig {
    pub fn validate(&self) -> DrapeResult<()> {
        self.cloth.validate()?;
        self.collision.validate()?;
        if let Some(limit) = self.tear_limit {
            if !(limit > 1.0) {
                return Err(DrapeError::InvalidConfig(format!(
                    "tear_limit must exceed 1, got {limit}"
                )));
            }
        }
        Ok(())
    }
}
