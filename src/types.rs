use std::fmt;

use bevy::math::{IVec2, IVec3};
use serde::{Deserialize, Serialize};

use crate::constants::{BUILD_CELL_SIZE, CHUNK_SIZE};
use crate::keys::{NodeId, PathKey};

/// Namespaced identifier of a structure type, e.g. `minecraft:village_plains`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureKind(pub String);

impl StructureKind {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chunk coordinates (x, z)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn containing(block: IVec3) -> Self {
        Self {
            x: block.x.div_euclid(CHUNK_SIZE),
            z: block.z.div_euclid(CHUNK_SIZE),
        }
    }

    /// Block at the centre of the chunk, at height `y`
    pub fn center_block(&self, y: i32) -> IVec3 {
        IVec3::new(
            self.x * CHUNK_SIZE + CHUNK_SIZE / 2,
            y,
            self.z * CHUNK_SIZE + CHUNK_SIZE / 2,
        )
    }

    pub fn distance_squared(&self, other: ChunkPos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }
}

/// Cell of the build queue containing a block
pub fn build_cell(block: IVec3) -> IVec2 {
    IVec2::new(
        block.x.div_euclid(BUILD_CELL_SIZE),
        block.z.div_euclid(BUILD_CELL_SIZE),
    )
}

/// A connectable point of interest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: IVec3,
    pub kind: StructureKind,
}

/// Lifecycle of an edge's route computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeStatus {
    New,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    pub status: EdgeStatus,
}

/// Lifecycle of a path document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PathStatus {
    Pending = 0,
    Processing = 1,
    Ready = 2,
    Failed = 3,
}

impl PathStatus {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(PathStatus::Pending),
            1 => Some(PathStatus::Processing),
            2 => Some(PathStatus::Ready),
            3 => Some(PathStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PathStatus::Ready | PathStatus::Failed)
    }
}

/// Routed geometry of a path; `water_mask` is parallel to `points`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathGeometry {
    pub points: Vec<IVec3>,
    pub water_mask: Vec<bool>,
    pub buoys: Vec<IVec3>,
}

impl PathGeometry {
    pub fn from_points(points: Vec<IVec3>) -> Self {
        Self {
            points,
            water_mask: Vec::new(),
            buoys: Vec::new(),
        }
    }
}

/// A path document as seen by readers of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub status: PathStatus,
    pub geometry: PathGeometry,
}

/// Inclusive index range `start..=end` of a READY path, queued for painting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildSegment {
    pub path: PathKey,
    pub start: usize,
    pub end: usize,
}
