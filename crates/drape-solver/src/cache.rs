//! Frame cache: snapshots of cloth state keyed by frame number.
//!
//! Snapshots capture the full vertex and spring arrays so a cached
//! frame can be restored into the live state bit-for-bit. Snapshots
//! serialize with `bincode` for host-side persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use drape_types::{DrapeError, DrapeResult};

use crate::spring::ClothSpring;
use crate::state::ClothVertex;

/// Cloth state captured at one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: i32,
    pub vertices: Vec<ClothVertex>,
    pub springs: Vec<ClothSpring>,
}

impl FrameSnapshot {
    /// Serializes to compact binary format.
    pub fn to_bytes(&self) -> DrapeResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| DrapeError::Serialization(e.to_string()))
    }

    /// Deserializes from binary format.
    pub fn from_bytes(data: &[u8]) -> DrapeResult<Self> {
        bincode::deserialize(data)
            .map_err(|e| DrapeError::Serialization(format!("snapshot decode failed: {e}")))
    }
}

/// Which cached frames [`FrameCache::free`] drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurgePolicy {
    /// Drop every frame.
    All,
    /// Drop every frame except the earliest.
    KeepFirst,
    /// Drop every frame after the given one.
    After(i32),
}

/// Ordered store of frame snapshots.
#[derive(Debug, Clone, Default)]
pub struct FrameCache {
    frames: BTreeMap<i32, FrameSnapshot>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `frame` is cached.
    pub fn search(&self, frame: i32) -> bool {
        self.frames.contains_key(&frame)
    }

    pub fn get(&self, frame: i32) -> Option<&FrameSnapshot> {
        self.frames.get(&frame)
    }

    /// Stores `snapshot`, replacing any snapshot already cached at its frame.
    pub fn set(&mut self, snapshot: FrameSnapshot) {
        self.frames.insert(snapshot.frame, snapshot);
    }

    pub fn free(&mut self, policy: PurgePolicy) {
        let before = self.frames.len();
        match policy {
            PurgePolicy::All => self.frames.clear(),
            PurgePolicy::KeepFirst => {
                if let Some(next) = self.first_frame().and_then(|f| f.checked_add(1)) {
                    let _ = self.frames.split_off(&next);
                }
            }
            PurgePolicy::After(frame) => {
                if let Some(next) = frame.checked_add(1) {
                    let _ = self.frames.split_off(&next);
                }
            }
        }
        debug!(?policy, dropped = before - self.frames.len(), "purged frame cache");
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first_frame(&self) -> Option<i32> {
        self.frames.keys().next().copied()
    }

    pub fn last_frame(&self) -> Option<i32> {
        self.frames.keys().next_back().copied()
    }

    /// Cached frame numbers in ascending order.
    pub fn frames(&self) -> impl Iterator<Item = i32> + '_ {
        self.frames.keys().copied()
    }
}
