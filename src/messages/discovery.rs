use bevy::prelude::*;

use crate::keys::{EdgeKey, NodeId};
use crate::types::StructureKind;

/// Ask the road network to look for structures around a block position.
#[derive(Message, Debug, Clone)]
pub struct ScanRequest {
    pub origin: IVec3,
    /// Overrides the configured scan radius, in chunks
    pub radius: Option<i32>,
}

impl ScanRequest {
    pub fn around(origin: IVec3) -> Self {
        Self {
            origin,
            radius: None,
        }
    }
}

/// A structure became a node of the graph.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct NodeDiscovered {
    pub id: NodeId,
    pub position: IVec3,
    pub kind: StructureKind,
    pub edges: Vec<EdgeKey>,
}
