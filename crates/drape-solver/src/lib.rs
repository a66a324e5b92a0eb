//! # drape-solver
//!
//! Spring networks, cloth state, the frame cache and time integration.
//!
//! ## Key Types
//!
//! - [`ClothState`]: per-vertex and per-spring simulation state
//! - [`build_springs`]: structural, shear and bending springs from topology
//! - [`SolverStrategy`]: pluggable integrator trait
//! - [`DampedVerlet`]: position Verlet with spring relaxation
//! - [`FrameCache`]: snapshots keyed by frame number
//! - [`ClothConfig`]: integration parameters

pub mod cache;
pub mod config;
pub mod spring;
pub mod state;
pub mod strategy;
pub mod verlet;

pub use cache::{FrameCache, FrameSnapshot, PurgePolicy};
pub use config::ClothConfig;
pub use spring::{build_springs, ClothSpring, SpringFlags, SpringKind};
pub use state::{ClothState, ClothVertex, VertexFlags};
pub use strategy::{SolverKind, SolverStrategy, StepResult};
pub use verlet::DampedVerlet;
