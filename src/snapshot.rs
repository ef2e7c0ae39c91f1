//! On-disk snapshot of a road network
//!
//! Everything is addressed by its canonical string key. Records whose key no
//! longer parses are logged and skipped on load instead of failing the whole
//! snapshot.

use std::path::Path as FsPath;

use bevy::math::{IVec2, IVec3};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::build_queue::BuildQueue;
use crate::error::Result;
use crate::graph::ConnectivityGraph;
use crate::keys::{EdgeKey, PathKey};
use crate::store::PathStore;
use crate::types::{BuildSegment, EdgeStatus, Node, Path, PathGeometry, PathStatus};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub key: String,
    pub status: EdgeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    pub key: String,
    pub status: PathStatus,
    pub points: Vec<IVec3>,
    pub water_mask: Vec<bool>,
    pub buoys: Vec<IVec3>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub cell: IVec2,
    pub path: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub version: u32,
    pub world: String,
    pub next_node_id: u64,
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeRecord>,
    pub paths: Vec<PathRecord>,
    #[serde(default)]
    pub segments: Vec<SegmentRecord>,
}

/// Live state rebuilt from a snapshot
pub struct RestoredNetwork {
    pub graph: ConnectivityGraph,
    pub paths: Vec<(PathKey, Path)>,
    pub segments: Vec<(IVec2, BuildSegment)>,
    /// Records dropped because their key was malformed
    pub skipped: usize,
}

impl NetworkSnapshot {
    pub fn capture(
        world: &str,
        graph: &ConnectivityGraph,
        store: &PathStore,
        queue: &BuildQueue,
    ) -> Self {
        let mut nodes: Vec<Node> = graph.nodes().cloned().collect();
        nodes.sort_by_key(|n| n.id);

        let mut edges: Vec<(EdgeKey, EdgeStatus)> =
            graph.edges().map(|(key, edge)| (*key, edge.status)).collect();
        edges.sort_by_key(|(key, _)| *key);

        Self {
            version: SNAPSHOT_VERSION,
            world: world.to_string(),
            next_node_id: graph.next_id(),
            nodes,
            edges: edges
                .into_iter()
                .map(|(key, status)| EdgeRecord {
                    key: key.to_string(),
                    status,
                })
                .collect(),
            paths: store
                .snapshot()
                .into_iter()
                .map(|(key, path)| PathRecord {
                    key: key.to_string(),
                    status: path.status,
                    points: path.geometry.points,
                    water_mask: path.geometry.water_mask,
                    buoys: path.geometry.buoys,
                })
                .collect(),
            segments: queue
                .snapshot()
                .into_iter()
                .map(|(cell, segment)| SegmentRecord {
                    cell,
                    path: segment.path.to_string(),
                    start: segment.start,
                    end: segment.end,
                })
                .collect(),
        }
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    pub fn write_to(&self, path: impl AsRef<FsPath>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<FsPath>) -> Result<Self> {
        Self::from_ron(&std::fs::read_to_string(path)?)
    }

    /// Parse every key and rebuild the live structures
    pub fn restore(self) -> RestoredNetwork {
        let world = self.world;
        let mut skipped = 0;

        let edges: Vec<(EdgeKey, EdgeStatus)> = self
            .edges
            .into_iter()
            .filter_map(|record| match record.key.parse::<EdgeKey>() {
                Ok(key) => Some((key, record.status)),
                Err(err) => {
                    warn!("[{}] Skipping edge record: {}", world, err);
                    skipped += 1;
                    None
                }
            })
            .collect();

        let paths: Vec<(PathKey, Path)> = self
            .paths
            .into_iter()
            .filter_map(|record| match record.key.parse::<PathKey>() {
                Ok(key) => Some((
                    key,
                    Path {
                        status: record.status,
                        geometry: PathGeometry {
                            points: record.points,
                            water_mask: record.water_mask,
                            buoys: record.buoys,
                        },
                    },
                )),
                Err(err) => {
                    warn!("[{}] Skipping path record: {}", world, err);
                    skipped += 1;
                    None
                }
            })
            .collect();

        let segments: Vec<(IVec2, BuildSegment)> = self
            .segments
            .into_iter()
            .filter_map(|record| match record.path.parse::<PathKey>() {
                Ok(path) => Some((
                    record.cell,
                    BuildSegment {
                        path,
                        start: record.start,
                        end: record.end,
                    },
                )),
                Err(err) => {
                    warn!("[{}] Skipping build segment: {}", world, err);
                    skipped += 1;
                    None
                }
            })
            .collect();

        RestoredNetwork {
            graph: ConnectivityGraph::from_parts(self.nodes, edges, self.next_node_id),
            paths,
            segments,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::NodeId;
    use crate::types::StructureKind;

    fn sample_network() -> (ConnectivityGraph, PathStore, BuildQueue) {
        let mut graph = ConnectivityGraph::new();
        let kind = StructureKind::new("minecraft:village_desert");
        let (a, _) = graph.add_node(IVec3::new(0, 64, 0), kind.clone());
        let (b, _) = graph.add_node(IVec3::new(30, 70, 0), kind.clone());
        let (c, _) = graph.add_node(IVec3::new(0, 66, -40), kind);
        let ab = graph.connect(a, b, 100).unwrap();
        let ac = graph.connect(a, c, 100).unwrap();
        graph.set_edge_status(ab, EdgeStatus::Success);
        graph.set_edge_status(ac, EdgeStatus::Failure);

        let store = PathStore::new();
        let ready = PathGeometry {
            points: vec![IVec3::new(0, 64, 0), IVec3::new(1, 64, 0)],
            water_mask: vec![false, true],
            buoys: vec![IVec3::new(1, 64, 0)],
        };
        store.insert(ab.into(), PathStatus::Ready, ready.clone());
        store.insert(ac.into(), PathStatus::Failed, PathGeometry::default());
        store.insert(
            PathKey::from(ab).trunk(IVec3::new(5, 64, -3)),
            PathStatus::Pending,
            PathGeometry::from_points(vec![IVec3::new(5, 64, -3), IVec3::new(6, 64, -3)]),
        );

        let queue = BuildQueue::new();
        queue.enqueue_path(&ab.into(), &ready.points);
        (graph, store, queue)
    }

    #[test]
    fn round_trip_reproduces_the_network() {
        let (graph, store, queue) = sample_network();
        let snapshot = NetworkSnapshot::capture("overworld", &graph, &store, &queue);

        let text = snapshot.to_ron().unwrap();
        let decoded = NetworkSnapshot::from_ron(&text).unwrap();
        assert_eq!(decoded, snapshot);

        let restored = decoded.restore();
        assert_eq!(restored.skipped, 0);
        assert_eq!(restored.graph, graph);
        assert_eq!(restored.paths, store.snapshot());
        assert_eq!(restored.segments, queue.snapshot());
    }

    #[test]
    fn restored_allocator_never_reuses_ids() {
        let (mut graph, store, queue) = sample_network();
        let kind = StructureKind::new("minecraft:village_desert");
        let (temp, _) = graph.add_node(IVec3::new(500, 64, 500), kind.clone());
        graph.remove_node(temp);

        let restored = NetworkSnapshot::capture("overworld", &graph, &store, &queue).restore();
        let mut rebuilt = restored.graph;
        let (fresh, _) = rebuilt.add_node(IVec3::new(600, 64, 600), kind);
        assert_eq!(fresh, NodeId(4));
    }

    #[test]
    fn malformed_keys_are_skipped() {
        let (graph, store, queue) = sample_network();
        let mut snapshot = NetworkSnapshot::capture("overworld", &graph, &store, &queue);
        snapshot.edges[0].key = "7-8".to_string();
        snapshot.paths[0].key = "1+2@x".to_string();

        let restored = snapshot.restore();
        assert_eq!(restored.skipped, 2);
        assert_eq!(restored.graph.edge_count(), 1);
        assert_eq!(restored.paths.len(), 2);
    }
}
