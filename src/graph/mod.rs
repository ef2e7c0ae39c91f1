//! Planar connectivity graph between discovered structures
//!
//! Planarity is kept incrementally: every candidate edge is tested against all
//! existing edges it does not share an endpoint with, and rejected if the two
//! segments touch. There is no global re-triangulation.

use std::collections::HashMap;

use bevy::log::debug;
use bevy::math::IVec3;
use thiserror::Error;

use crate::keys::{EdgeKey, NodeId};
use crate::settings::{ConnectOrder, GraphSettings};
use crate::types::{Edge, EdgeStatus, Node, StructureKind};

pub mod geometry;

use geometry::{distance_squared_xz, segments_cross};

/// Why `connect` refused an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectRejection {
    #[error("a node cannot connect to itself")]
    SameNode,
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("nodes are further apart than twice the connection radius")]
    TooFar,
    #[error("edge already exists")]
    Duplicate,
    #[error("segment would cross edge {0}")]
    Crosses(EdgeKey),
}

/// Outcome of inserting a node and connecting it to its neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInsertion {
    pub id: NodeId,
    /// False when a node already occupied the column
    pub created: bool,
    pub edges: Vec<EdgeKey>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectivityGraph {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeKey, Edge>,
    next_id: u64,
}

impl ConnectivityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted parts
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = (EdgeKey, EdgeStatus)>,
        next_id: u64,
    ) -> Self {
        let nodes: HashMap<NodeId, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let floor = nodes.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        let edges = edges
            .into_iter()
            .map(|(key, status)| {
                (
                    key,
                    Edge {
                        a: key.low(),
                        b: key.high(),
                        status,
                    },
                )
            })
            .collect();
        Self {
            nodes,
            edges,
            next_id: next_id.max(floor),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    pub fn edge_by_key(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.get(&key)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &Edge)> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges_with_status(&self, status: EdgeStatus) -> Vec<EdgeKey> {
        self.edges
            .iter()
            .filter(|(_, edge)| edge.status == status)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Node occupying column (x, z), if any
    pub fn node_at(&self, x: i32, z: i32) -> Option<&Node> {
        self.nodes
            .values()
            .find(|n| n.position.x == x && n.position.z == z)
    }

    /// Endpoint positions of an edge
    pub fn endpoints(&self, key: EdgeKey) -> Option<(IVec3, IVec3)> {
        let a = self.nodes.get(&key.low())?;
        let b = self.nodes.get(&key.high())?;
        Some((a.position, b.position))
    }

    /// Adjacency list of the accepted edges
    pub fn adjacency(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut graph: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for key in self.edges.keys() {
            graph.entry(key.low()).or_default().push(key.high());
            graph.entry(key.high()).or_default().push(key.low());
        }
        graph
    }

    /// Create a node, or return the one already standing in the same column
    pub fn add_node(&mut self, position: IVec3, kind: StructureKind) -> (NodeId, bool) {
        if let Some(existing) = self.node_at(position.x, position.z) {
            return (existing.id, false);
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node { id, position, kind });
        (id, true)
    }

    /// Try to add an edge between two existing nodes.
    ///
    /// `radius` is the reach of a single node, so the nodes may be up to
    /// `2 * radius` apart horizontally.
    pub fn connect(&mut self, a: NodeId, b: NodeId, radius: i32) -> Result<EdgeKey, ConnectRejection> {
        if a == b {
            return Err(ConnectRejection::SameNode);
        }
        let pa = self.nodes.get(&a).ok_or(ConnectRejection::UnknownNode(a))?.position;
        let pb = self.nodes.get(&b).ok_or(ConnectRejection::UnknownNode(b))?.position;

        let reach = 2 * radius as i64;
        if distance_squared_xz(pa, pb) > reach * reach {
            return Err(ConnectRejection::TooFar);
        }

        let key = EdgeKey::new(a, b);
        if self.edges.contains_key(&key) {
            return Err(ConnectRejection::Duplicate);
        }

        if let Some(blocking) = self.first_crossing(key, pa, pb) {
            return Err(ConnectRejection::Crosses(blocking));
        }

        self.edges.insert(
            key,
            Edge {
                a: key.low(),
                b: key.high(),
                status: EdgeStatus::New,
            },
        );
        Ok(key)
    }

    /// First existing edge, disjoint from `candidate`, whose segment touches `pa-pb`
    fn first_crossing(&self, candidate: EdgeKey, pa: IVec3, pb: IVec3) -> Option<EdgeKey> {
        self.edges.keys().copied().find(|existing| {
            if existing.shares_endpoint(&candidate) {
                return false;
            }
            let Some((qa, qb)) = self.endpoints(*existing) else {
                return false;
            };
            segments_cross(pa, pb, qa, qb)
        })
    }

    /// Insert a node and connect it to every other node it can reach.
    ///
    /// Rejected connections are skipped and never retried.
    pub fn add_node_with_edges(
        &mut self,
        position: IVec3,
        kind: StructureKind,
        settings: &GraphSettings,
    ) -> NodeInsertion {
        let (id, created) = self.add_node(position, kind);
        if !created {
            return NodeInsertion {
                id,
                created,
                edges: Vec::new(),
            };
        }

        let mut edges = Vec::new();
        for other in self.connect_order(id, position, settings.connect_order) {
            match self.connect(id, other, settings.connection_radius) {
                Ok(key) => edges.push(key),
                Err(reason) => debug!("Skipping edge {}: {}", EdgeKey::new(id, other), reason),
            }
        }

        NodeInsertion { id, created, edges }
    }

    fn connect_order(&self, id: NodeId, position: IVec3, order: ConnectOrder) -> Vec<NodeId> {
        let mut others: Vec<&Node> = self.nodes.values().filter(|n| n.id != id).collect();
        match order {
            ConnectOrder::Storage => {}
            ConnectOrder::NodeId => others.sort_by_key(|n| n.id),
            ConnectOrder::Distance => {
                others.sort_by_key(|n| (distance_squared_xz(position, n.position), n.id))
            }
        }
        others.into_iter().map(|n| n.id).collect()
    }

    /// Remove a node and all edges touching it; returns the removed edge keys
    pub fn remove_node(&mut self, id: NodeId) -> Vec<EdgeKey> {
        if self.nodes.remove(&id).is_none() {
            return Vec::new();
        }
        let removed: Vec<EdgeKey> = self.edges.keys().filter(|k| k.contains(id)).copied().collect();
        for key in &removed {
            self.edges.remove(key);
        }
        removed
    }

    pub fn remove_edge(&mut self, key: EdgeKey) -> Option<Edge> {
        self.edges.remove(&key)
    }

    /// Drop an edge and connect its endpoints again, restarting its lifecycle
    pub fn recreate_edge(&mut self, key: EdgeKey, radius: i32) -> Result<EdgeKey, ConnectRejection> {
        self.edges.remove(&key);
        self.connect(key.low(), key.high(), radius)
    }

    /// Only the path computer moves an edge out of NEW
    pub(crate) fn set_edge_status(&mut self, key: EdgeKey, status: EdgeStatus) -> bool {
        match self.edges.get_mut(&key) {
            Some(edge) => {
                edge.status = status;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests;
