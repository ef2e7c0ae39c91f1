mod common;

use bevy::math::IVec3;
use common::{flat, temp_file, village};
use roadnet::RoadNetwork;
use roadnet::keys::NodeId;
use roadnet::settings::RoadNetworkSettings;
use roadnet::snapshot::{NetworkSnapshot, SNAPSHOT_VERSION};
use roadnet::spatial::StructureRegistry;
use roadnet::tasks::WorkerPool;
use roadnet::types::PathStatus;

fn empty_network() -> RoadNetwork {
    RoadNetwork::new(
        "overworld",
        RoadNetworkSettings::default(),
        StructureRegistry::vanilla(),
    )
}

/// Three villages, routed; only some paths post-processed
fn half_finished_network() -> RoadNetwork {
    let mut network = empty_network();
    let terrain = flat(64);
    let pool = WorkerPool::with_threads(2);
    network.add_structure(IVec3::new(0, 64, 0), village());
    network.add_structure(IVec3::new(60, 64, 0), village());
    network.add_structure(IVec3::new(30, 64, 70), village());
    network.compute_paths(&terrain, &pool);
    network.post_process_batch(&terrain, &WorkerPool::with_threads(1));
    network
}

#[test]
fn file_round_trip_reproduces_the_network() {
    let network = half_finished_network();
    let path = temp_file("file_round_trip.ron");

    network.save(&path).unwrap();
    let mut loaded = empty_network();
    let report = loaded.load(&path).unwrap();

    assert_eq!(report.nodes, 3);
    assert_eq!(report.edges, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.recovered, 0);
    assert_eq!(loaded.snapshot(), network.snapshot());
    assert_eq!(loaded.store().snapshot(), network.store().snapshot());
    assert_eq!(loaded.build_queue().snapshot(), network.build_queue().snapshot());

    let _ = std::fs::remove_file(path);
}

#[test]
fn loaded_network_keeps_processing() {
    let network = half_finished_network();
    let pending_before = network.store().pending_keys().len();
    assert!(pending_before > 0);

    let mut loaded = empty_network();
    loaded.restore(network.snapshot());
    let reports = loaded.post_process(&flat(64));

    assert!(!reports.is_empty());
    assert!(loaded.store().pending_keys().is_empty());
    assert_eq!(
        loaded.store().keys_with_status(PathStatus::Ready).len(),
        network.store().len()
    );
}

#[test]
fn node_ids_stay_unique_across_reloads() {
    let mut network = half_finished_network();
    network.remove_node(NodeId(2));

    let mut loaded = empty_network();
    loaded.restore(network.snapshot());
    let fresh = loaded.add_structure(IVec3::new(-50, 64, -50), village());

    assert_eq!(fresh.id, NodeId(3));
}

#[test]
fn hand_edited_snapshot_with_bad_keys_still_loads() {
    let source = format!(
        r#"(
    version: {SNAPSHOT_VERSION},
    world: "overworld",
    next_node_id: 2,
    nodes: [
        (id: 0, position: (0, 64, 0), kind: "minecraft:village_plains"),
        (id: 1, position: (20, 64, 0), kind: "minecraft:village_plains"),
    ],
    edges: [
        (key: "0+1", status: Success),
        (key: "zero+one", status: New),
    ],
    paths: [
        (key: "0+1", status: Processing, points: [(0, 64, 0), (1, 64, 0)], water_mask: [false, false], buoys: []),
        (key: "0+1@1,2", status: Ready, points: [], water_mask: [], buoys: []),
    ],
)"#
    );

    let snapshot = NetworkSnapshot::from_ron(&source).unwrap();
    let mut network = empty_network();
    let report = network.restore(snapshot);

    assert_eq!(report.skipped, 2);
    assert_eq!(report.edges, 1);
    assert_eq!(report.recovered, 1);
    assert_eq!(
        network.store().pending_keys().iter().map(|k| k.to_string()).collect::<Vec<_>>(),
        vec!["0+1".to_string()]
    );
}
