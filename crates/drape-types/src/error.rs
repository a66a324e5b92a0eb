//! Error types for the drape simulator.
//!
//! All crates return `DrapeResult<T>` from fallible operations. Degenerate
//! geometry never surfaces here; it is handled where it is found.

use thiserror::Error;

/// Unified error type for the drape simulator.
#[derive(Debug, Error)]
pub enum DrapeError {
    /// Surface data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The surface has no edges, so no spring network can be built.
    #[error("Surface has no edges; cannot build a spring network")]
    NoEdges,

    /// An array backing cloth state, springs or a bounding volume tree
    /// could not be allocated.
    #[error("Failed to allocate {count} {what}")]
    Allocation {
        what: &'static str,
        count: usize,
    },

    /// Vertex count of the live state differs from the surface it is fed.
    #[error("Topology changed: expected {expected} vertices, found {found}")]
    TopologyMismatch {
        expected: usize,
        found: usize,
    },

    /// A solver was stepped before `init` succeeded.
    #[error("Solver not initialized: {0}")]
    SolverNotInitialized(String),

    /// No snapshot is cached for the requested frame.
    #[error("No cached state for frame {0}")]
    CacheMiss(i32),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, DrapeError>`.
pub type DrapeResult<T> = Result<T, DrapeError>;

/// Reserve room for `count` more elements, mapping failure to
/// [`DrapeError::Allocation`].
pub fn try_reserve<T>(buf: &mut Vec<T>, count: usize, what: &'static str) -> DrapeResult<()> {
    buf.try_reserve_exact(count)
        .map_err(|_| DrapeError::Allocation { what, count })
}
