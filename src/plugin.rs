//! Bevy integration of the road network pipeline
//!
//! Each frame the systems run in order: queue scan requests, resolve scans
//! into nodes, start route searches for new edges, collect finished
//! searches, then post-process a batch of PENDING paths.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{Task, block_on};

use crate::computer::RouteResult;
use crate::messages::{NodeDiscovered, PathFinalized, RoutesApplied, ScanRequest};
use crate::network::RoadNetwork;
use crate::settings::RoadNetworkSettings;
use crate::spatial::{StructureOracle, StructureRegistry};
use crate::tasks::WorkerPool;
use crate::terrain::TerrainOracle;

/// World access the host supplies; systems idle until it is inserted.
#[derive(Resource, Clone)]
pub struct WorldOracles {
    pub terrain: Arc<dyn TerrainOracle>,
    pub structures: Arc<dyn StructureOracle>,
}

/// Route searches still running on the pool
#[derive(Resource, Default)]
pub struct RouteTasks(pub Vec<Task<RouteResult>>);

impl RouteTasks {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoadNetworkSet {
    Discover,
    Route,
    PostProcess,
}

pub struct RoadNetworkPlugin {
    pub world: String,
    pub settings: RoadNetworkSettings,
    pub registry: StructureRegistry,
}

impl Default for RoadNetworkPlugin {
    fn default() -> Self {
        Self {
            world: "overworld".to_string(),
            settings: RoadNetworkSettings::default(),
            registry: StructureRegistry::vanilla(),
        }
    }
}

impl Plugin for RoadNetworkPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .insert_resource(RoadNetwork::new(
                self.world.clone(),
                self.settings.clone(),
                self.registry.clone(),
            ))
            .init_resource::<WorkerPool>()
            .init_resource::<RouteTasks>()
            .add_message::<ScanRequest>()
            .add_message::<NodeDiscovered>()
            .add_message::<RoutesApplied>()
            .add_message::<PathFinalized>()
            .configure_sets(
                Update,
                (
                    RoadNetworkSet::Discover,
                    RoadNetworkSet::Route,
                    RoadNetworkSet::PostProcess,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    sync_settings.run_if(resource_changed::<RoadNetworkSettings>),
                    queue_scan_requests,
                    resolve_scans.run_if(resource_exists::<WorldOracles>),
                )
                    .chain()
                    .in_set(RoadNetworkSet::Discover),
            )
            .add_systems(
                Update,
                (dispatch_route_searches, collect_route_results)
                    .chain()
                    .in_set(RoadNetworkSet::Route)
                    .run_if(resource_exists::<WorldOracles>),
            )
            .add_systems(
                Update,
                post_process_paths
                    .in_set(RoadNetworkSet::PostProcess)
                    .run_if(resource_exists::<WorldOracles>),
            );
    }
}

fn sync_settings(settings: Res<RoadNetworkSettings>, mut network: ResMut<RoadNetwork>) {
    match settings.clone().validated() {
        Ok(valid) => network.set_settings(valid),
        Err(err) => error!("[{}] Ignoring settings change: {}", network.world(), err),
    }
}

fn queue_scan_requests(
    mut requests: MessageReader<ScanRequest>,
    network: Res<RoadNetwork>,
    oracles: Option<Res<WorldOracles>>,
    pool: Res<WorkerPool>,
) {
    for request in requests.read() {
        let Some(oracles) = oracles.as_ref() else {
            warn!(
                "[{}] Dropping scan around {}: no world oracles",
                network.world(),
                request.origin
            );
            continue;
        };
        let seed = oracles.structures.world_seed();
        network.request_scan(request.origin, request.radius, seed, &pool);
    }
}

fn resolve_scans(
    mut network: ResMut<RoadNetwork>,
    oracles: Res<WorldOracles>,
    mut discovered: MessageWriter<NodeDiscovered>,
) {
    for insertion in network.resolve_scans(oracles.structures.as_ref()) {
        let Some(node) = network.graph().node(insertion.id) else {
            continue;
        };
        discovered.write(NodeDiscovered {
            id: node.id,
            position: node.position,
            kind: node.kind.clone(),
            edges: insertion.edges,
        });
    }
}

fn dispatch_route_searches(
    mut network: ResMut<RoadNetwork>,
    oracles: Res<WorldOracles>,
    pool: Res<WorkerPool>,
    mut tasks: ResMut<RouteTasks>,
) {
    let started = network.dispatch_routes(oracles.terrain.clone(), &pool);
    tasks.0.extend(started);
}

fn collect_route_results(
    mut network: ResMut<RoadNetwork>,
    mut tasks: ResMut<RouteTasks>,
    mut applied: MessageWriter<RoutesApplied>,
) {
    let (finished, running): (Vec<_>, Vec<_>) =
        std::mem::take(&mut tasks.0).into_iter().partition(|t| t.is_finished());
    tasks.0 = running;
    if finished.is_empty() {
        return;
    }

    let report = network.apply_routes(finished.into_iter().map(|task| block_on(task)));
    applied.write(RoutesApplied {
        routed: report.routed,
        failed: report.failed,
    });
}

fn post_process_paths(
    network: Res<RoadNetwork>,
    oracles: Res<WorldOracles>,
    pool: Res<WorkerPool>,
    mut finalized: MessageWriter<PathFinalized>,
) {
    if network.store().pending_keys().is_empty() {
        return;
    }
    for report in network.post_process_batch(oracles.terrain.as_ref(), &pool) {
        for key in report.finalized {
            finalized.write(PathFinalized { key });
        }
    }
}
