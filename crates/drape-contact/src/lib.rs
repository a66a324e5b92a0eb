//! # drape-contact
//!
//! Collision detection and response between cloth and kinematic obstacles.
//!
//! The pipeline is split into stages:
//! 1. **Bounding volume trees**: k-DOP quad-trees over each surface's
//!    faces, refit every frame
//! 2. **Broad phase**: dual-tree traversal producing leaf-pair candidates
//! 3. **Narrow phase**: triangle proximity within the contact epsilon
//! 4. **Response**: iterative impulses on the cloth's tentative velocities
//!
//! [`CollisionOrchestrator`] drives the stages through the static and
//! moving passes of each frame and commits the result.

pub mod broad;
pub mod bvh;
pub mod config;
pub mod narrow;
pub mod obstacle;
pub mod orchestrator;
pub mod response;
pub mod sort;

pub use broad::{collect_pairs, traverse, CandidatePair};
pub use bvh::{BoundingVolumeTree, BvtNode, NodeId};
pub use config::CollisionConfig;
pub use narrow::{detect, CollisionPair, ContactSide, ContactSource};
pub use obstacle::Obstacle;
pub use orchestrator::{CollisionOrchestrator, CollisionPass, CollisionReport, OrchestratorState, PassReport, RoundRecord};
pub use response::{ContactResponse, ImpulseResponse, NullContactResponse, ResponseResult};
