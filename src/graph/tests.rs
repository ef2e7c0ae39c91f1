use bevy::math::IVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::graph::geometry::segments_cross;
use crate::settings::{ConnectOrder, GraphSettings};

fn village() -> StructureKind {
    StructureKind::new("minecraft:village_plains")
}

fn node(graph: &mut ConnectivityGraph, x: i32, z: i32) -> NodeId {
    graph.add_node(IVec3::new(x, 64, z), village()).0
}

/// Every pair of accepted edges that does not share an endpoint is disjoint
fn assert_planar(graph: &ConnectivityGraph) {
    let edges: Vec<EdgeKey> = graph.edges().map(|(k, _)| *k).collect();
    for (i, a) in edges.iter().enumerate() {
        for b in &edges[i + 1..] {
            if a.shares_endpoint(b) {
                continue;
            }
            let (a1, a2) = graph.endpoints(*a).unwrap();
            let (b1, b2) = graph.endpoints(*b).unwrap();
            assert!(!segments_cross(a1, a2, b1, b2), "{a} crosses {b}");
        }
    }
}

#[test]
fn line_of_villages_connects_and_blocks_crossing() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 10, 0);

    assert_eq!(graph.connect(a, b, 15), Ok(EdgeKey::new(a, b)));

    let c = node(&mut graph, 20, 0);
    assert!(graph.connect(b, c, 15).is_ok());

    let d = node(&mut graph, 5, 20);
    let e = node(&mut graph, 15, -20);
    assert!(graph.connect(d, e, 15).is_err());
    assert!(graph.edge(a, b).is_some());
    assert!(graph.edge(d, e).is_none());
}

#[test]
fn crossing_is_rejected_even_within_reach() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 10, 0);
    let d = node(&mut graph, 5, 20);
    let e = node(&mut graph, 5, -20);

    let ab = graph.connect(a, b, 100).unwrap();
    assert_eq!(graph.connect(d, e, 100), Err(ConnectRejection::Crosses(ab)));

    // Once A-B is gone the same edge is fine
    graph.remove_edge(ab);
    assert!(graph.connect(d, e, 100).is_ok());
    assert_eq!(graph.connect(a, b, 100), Err(ConnectRejection::Crosses(EdgeKey::new(d, e))));
}

#[test]
fn edges_sharing_an_endpoint_may_meet() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 10, 0);
    let c = node(&mut graph, 5, 10);

    assert!(graph.connect(a, b, 50).is_ok());
    assert!(graph.connect(b, c, 50).is_ok());
    assert!(graph.connect(c, a, 50).is_ok());
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn connecting_twice_keeps_one_edge() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 3, 4);

    assert!(graph.connect(a, b, 10).is_ok());
    assert_eq!(graph.connect(a, b, 10), Err(ConnectRejection::Duplicate));
    assert_eq!(graph.connect(b, a, 10), Err(ConnectRejection::Duplicate));
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn self_and_unknown_nodes_are_rejected() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);

    assert_eq!(graph.connect(a, a, 10), Err(ConnectRejection::SameNode));
    assert_eq!(
        graph.connect(a, NodeId(99), 10),
        Err(ConnectRejection::UnknownNode(NodeId(99)))
    );
}

#[test]
fn reach_is_twice_the_radius() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 30, 0);
    let c = node(&mut graph, 0, 31);

    assert!(graph.connect(a, b, 15).is_ok());
    assert_eq!(graph.connect(a, c, 15), Err(ConnectRejection::TooFar));
}

#[test]
fn new_edges_start_new() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 5, 0);
    let key = graph.connect(a, b, 10).unwrap();

    assert_eq!(graph.edge_by_key(key).unwrap().status, EdgeStatus::New);
    assert_eq!(graph.edges_with_status(EdgeStatus::New), vec![key]);
}

#[test]
fn add_node_with_edges_connects_reachable_nodes() {
    let settings = GraphSettings {
        connection_radius: 15,
        connect_order: ConnectOrder::NodeId,
    };
    let mut graph = ConnectivityGraph::new();
    let a = graph.add_node_with_edges(IVec3::new(0, 64, 0), village(), &settings);
    let b = graph.add_node_with_edges(IVec3::new(10, 64, 0), village(), &settings);
    let far = graph.add_node_with_edges(IVec3::new(500, 64, 0), village(), &settings);

    assert!(a.edges.is_empty());
    assert_eq!(b.edges, vec![EdgeKey::new(a.id, b.id)]);
    assert!(far.edges.is_empty());
    assert_eq!(graph.node_count(), 3);
}

#[test]
fn same_column_returns_existing_node() {
    let settings = GraphSettings::default();
    let mut graph = ConnectivityGraph::new();
    let first = graph.add_node_with_edges(IVec3::new(4, 70, 4), village(), &settings);
    let again = graph.add_node_with_edges(IVec3::new(4, 90, 4), village(), &settings);

    assert!(first.created);
    assert!(!again.created);
    assert_eq!(first.id, again.id);
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn distance_order_prefers_short_edges() {
    let settings = GraphSettings {
        connection_radius: 100,
        connect_order: ConnectOrder::Distance,
    };
    let mut graph = ConnectivityGraph::new();
    let left = graph.add_node_with_edges(IVec3::new(-50, 64, 5), village(), &settings);
    let near = graph.add_node_with_edges(IVec3::new(0, 64, 10), village(), &settings);
    let insertion = graph.add_node_with_edges(IVec3::new(0, 64, 0), village(), &settings);

    assert_eq!(insertion.edges.first(), Some(&EdgeKey::new(insertion.id, near.id)));
    assert!(insertion.edges.contains(&EdgeKey::new(insertion.id, left.id)));
}

#[test]
fn removing_a_node_drops_its_edges() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 10, 0);
    let c = node(&mut graph, 10, 10);
    graph.connect(a, b, 20).unwrap();
    graph.connect(b, c, 20).unwrap();
    graph.connect(a, c, 20).unwrap();

    let mut removed = graph.remove_node(b);
    removed.sort();
    assert_eq!(removed, vec![EdgeKey::new(a, b), EdgeKey::new(b, c)]);
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.node(b).is_none());
    assert!(graph.remove_node(b).is_empty());
}

#[test]
fn recreated_edge_starts_over() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 10, 0);
    let key = graph.connect(a, b, 20).unwrap();
    graph.set_edge_status(key, EdgeStatus::Failure);

    assert_eq!(graph.recreate_edge(key, 20), Ok(key));
    assert_eq!(graph.edge_by_key(key).unwrap().status, EdgeStatus::New);
}

#[test]
fn random_insertions_stay_planar() {
    let settings = GraphSettings {
        connection_radius: 40,
        connect_order: ConnectOrder::Storage,
    };
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut graph = ConnectivityGraph::new();

    for _ in 0..60 {
        let x = rng.random_range(-150..150);
        let z = rng.random_range(-150..150);
        graph.add_node_with_edges(IVec3::new(x, 64, z), village(), &settings);
    }

    assert!(graph.edge_count() > 0);
    assert_planar(&graph);
}

#[test]
fn from_parts_never_reuses_ids() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 4, 0);
    let key = graph.connect(a, b, 10).unwrap();

    let nodes: Vec<Node> = graph.nodes().cloned().collect();
    let mut rebuilt = ConnectivityGraph::from_parts(nodes, [(key, EdgeStatus::Success)], 0);

    assert_eq!(rebuilt.next_id(), 2);
    let (fresh, _) = rebuilt.add_node(IVec3::new(50, 64, 50), village());
    assert_eq!(fresh, NodeId(2));
    assert_eq!(rebuilt.edge(a, b).unwrap().status, EdgeStatus::Success);
}

#[test]
fn adjacency_lists_both_directions() {
    let mut graph = ConnectivityGraph::new();
    let a = node(&mut graph, 0, 0);
    let b = node(&mut graph, 10, 0);
    graph.connect(a, b, 20).unwrap();

    let adjacency = graph.adjacency();
    assert_eq!(adjacency[&a], vec![b]);
    assert_eq!(adjacency[&b], vec![a]);
}
