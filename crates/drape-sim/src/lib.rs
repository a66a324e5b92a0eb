//! # drape-sim
//!
//! Frame driver for the cloth core. [`ClothSimulation`] binds a surface,
//! integrates it, resolves contacts against obstacles and itself, and caches
//! every frame. [`Scenario`] and [`ScenarioRunner`] provide canonical setups
//! and CSV-exportable run metrics.

pub mod config;
pub mod metrics;
pub mod runner;
pub mod scenarios;
pub mod simulation;

pub use config::SimulationConfig;
pub use metrics::RunMetrics;
pub use runner::ScenarioRunner;
pub use scenarios::{Scenario, ScenarioKind};
pub use simulation::{ClothSimulation, FrameReport};
