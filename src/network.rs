//! Per-world road network context
//!
//! [`RoadNetwork`] owns everything one world needs: the connectivity graph,
//! the path store, the build queue, the spatial index and the listeners.
//! Worlds never share state; the engine keeps one context per world.

use std::path::Path as FsPath;
use std::sync::Arc;

use bevy::math::IVec3;
use bevy::prelude::*;
use bevy::tasks::Task;

use crate::build_queue::BuildQueue;
use crate::computer::{ComputeReport, PathComputer, RouteResult};
use crate::error::Result;
use crate::graph::{ConnectRejection, ConnectivityGraph, NodeInsertion};
use crate::keys::{EdgeKey, NodeId, PathKey};
use crate::listeners::{DispatchReport, ListenerDispatcher, NetworkEvent, NetworkListener};
use crate::postprocess::{InvocationReport, PathPostProcessor, ProcessContext};
use crate::settings::RoadNetworkSettings;
use crate::snapshot::NetworkSnapshot;
use crate::spatial::{ScanHit, SpatialIndex, StructureOracle, StructureRegistry};
use crate::store::PathStore;
use crate::tasks::WorkerPool;
use crate::terrain::TerrainOracle;
use crate::types::{EdgeStatus, StructureKind};

/// What a snapshot load changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub nodes: usize,
    pub edges: usize,
    pub paths: usize,
    pub segments: usize,
    /// Records dropped for malformed keys
    pub skipped: usize,
    /// PROCESSING paths returned to PENDING
    pub recovered: usize,
}

#[derive(Resource)]
pub struct RoadNetwork {
    world: String,
    settings: RoadNetworkSettings,
    graph: ConnectivityGraph,
    store: Arc<PathStore>,
    queue: Arc<BuildQueue>,
    computer: PathComputer,
    index: SpatialIndex,
    listeners: ListenerDispatcher,
}

impl RoadNetwork {
    pub fn new(
        world: impl Into<String>,
        settings: RoadNetworkSettings,
        registry: StructureRegistry,
    ) -> Self {
        let world = world.into();
        Self {
            computer: PathComputer::new(world.clone()),
            world,
            settings,
            graph: ConnectivityGraph::new(),
            store: Arc::new(PathStore::new()),
            queue: Arc::new(BuildQueue::new()),
            index: SpatialIndex::new(registry),
            listeners: ListenerDispatcher::new(),
        }
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    pub fn settings(&self) -> &RoadNetworkSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: RoadNetworkSettings) {
        self.settings = settings;
    }

    pub fn graph(&self) -> &ConnectivityGraph {
        &self.graph
    }

    pub fn store(&self) -> &Arc<PathStore> {
        &self.store
    }

    /// Segments waiting for the world painter
    pub fn build_queue(&self) -> &Arc<BuildQueue> {
        &self.queue
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn spatial_index_mut(&mut self) -> &mut SpatialIndex {
        &mut self.index
    }

    pub fn routes_in_flight(&self) -> usize {
        self.computer.in_flight()
    }

    pub fn register_listener(&mut self, listener: Arc<dyn NetworkListener>) {
        self.listeners.register(listener);
    }

    fn notify(&self, events: &[NetworkEvent]) -> DispatchReport {
        if self.listeners.is_empty() {
            return DispatchReport::default();
        }
        self.listeners.dispatch_all(&self.world, events)
    }

    /// Insert a structure as a node and connect it to its neighbours
    pub fn add_structure(&mut self, position: IVec3, kind: StructureKind) -> NodeInsertion {
        let insertion = self
            .graph
            .add_node_with_edges(position, kind.clone(), &self.settings.graph);
        if !insertion.created {
            debug!(
                "[{}] Structure at {} is already node {}",
                self.world, position, insertion.id
            );
            return insertion;
        }

        info!(
            "[{}] Added node {} ({}) at {} with {} edges",
            self.world,
            insertion.id,
            kind,
            position,
            insertion.edges.len()
        );
        let mut events = vec![NetworkEvent::NodeAdded {
            id: insertion.id,
            position,
            kind,
        }];
        events.extend(insertion.edges.iter().copied().map(NetworkEvent::EdgeAdded));
        self.notify(&events);
        insertion
    }

    /// Add every hit as a node, skipping columns that already hold one
    pub fn ingest_hits(&mut self, hits: &[ScanHit]) -> Vec<NodeInsertion> {
        hits.iter()
            .map(|hit| self.add_structure(hit.position, hit.kind.clone()))
            .filter(|insertion| insertion.created)
            .collect()
    }

    /// Scan around `origin` with the configured selectors and add what is found
    pub fn discover(
        &mut self,
        origin: IVec3,
        oracle: &dyn StructureOracle,
        pool: &WorkerPool,
    ) -> Vec<NodeInsertion> {
        let scan = self.settings.scan.clone();
        let hits = self.index.scan(
            origin,
            scan.radius,
            scan.cell_radius,
            &scan.selectors,
            oracle,
            pool,
        );
        debug!("[{}] Scan around {} found {} structures", self.world, origin, hits.len());
        self.ingest_hits(&hits)
    }

    /// Queue a scan without resolving it
    pub fn request_scan(
        &self,
        origin: IVec3,
        radius: Option<i32>,
        seed: u64,
        pool: &WorkerPool,
    ) -> Option<u64> {
        let scan = &self.settings.scan;
        self.index.request(
            seed,
            origin,
            radius.unwrap_or(scan.radius),
            scan.cell_radius,
            &scan.selectors,
            pool,
        )
    }

    /// Resolve every queued scan and add the hits
    pub fn resolve_scans(&mut self, oracle: &dyn StructureOracle) -> Vec<NodeInsertion> {
        let hits: Vec<ScanHit> = self
            .index
            .resolve_pending(oracle)
            .into_iter()
            .flat_map(|outcome| outcome.hits)
            .collect();
        self.ingest_hits(&hits)
    }

    /// Remove a node with its edges, their paths and queued segments
    pub fn remove_node(&mut self, id: NodeId) -> Vec<EdgeKey> {
        let edges = self.graph.remove_node(id);
        let dropped = self.drop_paths_of(&edges);
        info!(
            "[{}] Removed node {}: {} edges, {} paths",
            self.world,
            id,
            edges.len(),
            dropped
        );
        self.notify(&[NetworkEvent::NodeRemoved {
            id,
            edges: edges.clone(),
        }]);
        edges
    }

    /// Restart the lifecycle of one edge, dropping its old paths
    pub fn recreate_edge(&mut self, key: EdgeKey) -> Result<EdgeKey, ConnectRejection> {
        self.drop_paths_of(&[key]);
        let recreated = self
            .graph
            .recreate_edge(key, self.settings.graph.connection_radius)?;
        info!("[{}] Recreated edge {}", self.world, recreated);
        self.notify(&[NetworkEvent::EdgeAdded(recreated)]);
        Ok(recreated)
    }

    /// Drop the edge paths and every trunk derived from them
    fn drop_paths_of(&self, edges: &[EdgeKey]) -> usize {
        let doomed: Vec<PathKey> = self
            .store
            .snapshot()
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| edges.contains(&key.edge()))
            .collect();
        for key in &doomed {
            self.store.remove(key);
            self.queue.remove_path(key);
        }
        doomed.len()
    }

    fn routed_events(&self, edges: &[EdgeKey]) -> Vec<NetworkEvent> {
        edges
            .iter()
            .filter_map(|edge| {
                let status = self.graph.edge_by_key(*edge)?.status;
                (status != EdgeStatus::New).then_some(NetworkEvent::EdgeRouted {
                    edge: *edge,
                    status,
                })
            })
            .collect()
    }

    /// Route every NEW edge and wait for the results
    pub fn compute_paths(&mut self, terrain: &dyn TerrainOracle, pool: &WorkerPool) -> ComputeReport {
        let new_edges = self.graph.edges_with_status(EdgeStatus::New);
        let report = self.computer.compute_new_edges(
            &mut self.graph,
            &self.store,
            terrain,
            &self.settings.search,
            pool,
        );
        if report != ComputeReport::default() {
            info!(
                "[{}] Routed {} edges, {} failed, {} discarded",
                self.world, report.routed, report.failed, report.discarded
            );
        }
        let events = self.routed_events(&new_edges);
        self.notify(&events);
        report
    }

    /// Start routing NEW edges without waiting
    pub fn dispatch_routes(
        &mut self,
        terrain: Arc<dyn TerrainOracle>,
        pool: &WorkerPool,
    ) -> Vec<Task<RouteResult>> {
        self.computer
            .dispatch(&self.graph, terrain, &self.settings.search, pool)
    }

    /// Record finished route searches
    pub fn apply_routes(&mut self, results: impl IntoIterator<Item = RouteResult>) -> ComputeReport {
        let mut report = ComputeReport::default();
        let mut edges = Vec::new();
        for result in results {
            edges.push(result.edge);
            self.computer
                .apply(&mut self.graph, &self.store, result, &mut report);
        }
        let events = self.routed_events(&edges);
        self.notify(&events);
        report
    }

    fn process_context<'a>(&'a self, terrain: &'a dyn TerrainOracle) -> ProcessContext<'a> {
        ProcessContext {
            world: &self.world,
            store: &self.store,
            queue: &self.queue,
            terrain,
            settings: &self.settings,
        }
    }

    fn finalized_events(&self, reports: &[InvocationReport]) {
        let events: Vec<NetworkEvent> = reports
            .iter()
            .flat_map(|r| r.finalized.iter().cloned())
            .map(NetworkEvent::PathFinalized)
            .collect();
        self.notify(&events);
    }

    /// Run up to one invocation per worker side by side
    pub fn post_process_batch(
        &self,
        terrain: &dyn TerrainOracle,
        pool: &WorkerPool,
    ) -> Vec<InvocationReport> {
        let reports =
            PathPostProcessor::run_batch(self.process_context(terrain), pool, pool.threads());
        self.finalized_events(&reports);
        reports
    }

    /// Post-process until no PENDING path is left
    pub fn post_process(&self, terrain: &dyn TerrainOracle) -> Vec<InvocationReport> {
        let reports = PathPostProcessor::run_until_idle(self.process_context(terrain));
        self.finalized_events(&reports);
        reports
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot::capture(&self.world, &self.graph, &self.store, &self.queue)
    }

    /// Replace the whole network with a snapshot. Paths interrupted mid-merge
    /// go back to PENDING.
    pub fn restore(&mut self, snapshot: NetworkSnapshot) -> LoadReport {
        if snapshot.world != self.world {
            warn!(
                "[{}] Loading snapshot taken in world {}",
                self.world, snapshot.world
            );
        }
        let restored = snapshot.restore();

        self.graph = restored.graph;
        self.computer = PathComputer::new(self.world.clone());
        self.store.clear();
        let paths = restored.paths.len();
        self.store.restore(restored.paths);
        let segments = restored.segments.len();
        self.queue.restore(restored.segments);
        let recovered = self.store.recover_interrupted();

        let report = LoadReport {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            paths,
            segments,
            skipped: restored.skipped,
            recovered,
        };
        info!("[{}] Restored road network: {:?}", self.world, report);
        report
    }

    pub fn save(&self, path: impl AsRef<FsPath>) -> Result<()> {
        self.snapshot().write_to(path)
    }

    pub fn load(&mut self, path: impl AsRef<FsPath>) -> Result<LoadReport> {
        let snapshot = NetworkSnapshot::read_from(path)?;
        Ok(self.restore(snapshot))
    }
}
