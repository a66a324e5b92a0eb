//! # drape-math
//!
//! Geometry primitives for the drape cloth simulator.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, etc.)
//! - The fixed k-DOP direction table and slab bounds
//! - Nearest points between triangles and barycentric weights

pub mod kdop;
pub mod proximity;

// Re-export glam types as the canonical math types for drape.
pub use glam::{Vec2, Vec3};

pub use kdop::{Kdop, KdopType};
pub use proximity::{barycentric_weights, triangle_normal, triangle_proximity, TriangleProximity};
