//! # drape-mesh
//!
//! The deformable-surface description the simulator consumes from its host:
//! vertex positions, edges, and triangle/quad faces.
//!
//! ## Key Types
//!
//! - [`Surface`]: positions, edges and faces of a cloth or obstacle.
//! - [`Face`]: a triangle or quad; quads carry a fourth index.
//! - Procedural generators for tests and demos (quad grids, UV spheres).

pub mod generators;
pub mod mesh;
pub mod normals;
pub mod topology;

pub use mesh::{Face, Surface};
