//! Route computation for NEW edges on the worker pool

use std::collections::HashSet;
use std::sync::Arc;

use bevy::math::IVec3;
use bevy::prelude::*;
use bevy::tasks::Task;

use crate::graph::ConnectivityGraph;
use crate::keys::{EdgeKey, PathKey};
use crate::pathfinding::{PathfindingSystem, SearchOutcome};
use crate::settings::SearchSettings;
use crate::store::PathStore;
use crate::tasks::WorkerPool;
use crate::terrain::TerrainOracle;
use crate::types::{EdgeStatus, PathGeometry, PathStatus};

/// One edge to route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteJob {
    pub edge: EdgeKey,
    pub start: IVec3,
    pub goal: IVec3,
}

impl RouteJob {
    pub fn run(&self, terrain: &dyn TerrainOracle, settings: &SearchSettings) -> RouteResult {
        RouteResult {
            edge: self.edge,
            outcome: PathfindingSystem::new(terrain, settings).find_path(self.start, self.goal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResult {
    pub edge: EdgeKey,
    pub outcome: SearchOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeReport {
    pub routed: usize,
    pub failed: usize,
    /// Results whose edge vanished or changed while the search ran
    pub discarded: usize,
}

/// Turns NEW edges into PENDING or FAILED paths
pub struct PathComputer {
    world: String,
    in_flight: HashSet<EdgeKey>,
}

impl PathComputer {
    pub fn new(world: impl Into<String>) -> Self {
        Self {
            world: world.into(),
            in_flight: HashSet::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// NEW edges not already being routed, marked in flight
    fn take_jobs(&mut self, graph: &ConnectivityGraph) -> Vec<RouteJob> {
        let mut jobs = Vec::new();
        for edge in graph.edges_with_status(EdgeStatus::New) {
            if self.in_flight.contains(&edge) {
                continue;
            }
            let Some((start, goal)) = graph.endpoints(edge) else {
                continue;
            };
            self.in_flight.insert(edge);
            jobs.push(RouteJob { edge, start, goal });
        }
        jobs
    }

    /// Route every NEW edge and wait for all of them.
    ///
    /// Every job is on the pool before the first result is read.
    pub fn compute_new_edges(
        &mut self,
        graph: &mut ConnectivityGraph,
        store: &PathStore,
        terrain: &dyn TerrainOracle,
        settings: &SearchSettings,
        pool: &WorkerPool,
    ) -> ComputeReport {
        let jobs = self.take_jobs(graph);
        if jobs.is_empty() {
            return ComputeReport::default();
        }
        debug!("[{}] Routing {} new edges", self.world, jobs.len());

        let results = pool.fan_out(jobs, |job| job.run(terrain, settings));

        let mut report = ComputeReport::default();
        for result in results {
            self.apply(graph, store, result, &mut report);
        }
        report
    }

    /// Start routing every NEW edge without waiting; feed the finished tasks
    /// back through [`Self::apply`]
    pub fn dispatch(
        &mut self,
        graph: &ConnectivityGraph,
        terrain: Arc<dyn TerrainOracle>,
        settings: &SearchSettings,
        pool: &WorkerPool,
    ) -> Vec<Task<RouteResult>> {
        let jobs = self.take_jobs(graph);
        if !jobs.is_empty() {
            debug!("[{}] Dispatching {} route searches", self.world, jobs.len());
        }
        jobs.into_iter()
            .map(|job| {
                let terrain = terrain.clone();
                let settings = settings.clone();
                pool.submit(async move { job.run(terrain.as_ref(), &settings) })
            })
            .collect()
    }

    /// Record one finished search
    pub fn apply(
        &mut self,
        graph: &mut ConnectivityGraph,
        store: &PathStore,
        result: RouteResult,
        report: &mut ComputeReport,
    ) {
        let edge = result.edge;
        self.in_flight.remove(&edge);

        if graph.edge_by_key(edge).map(|e| e.status) != Some(EdgeStatus::New) {
            debug!("[{}] Discarding route for {}: edge changed", self.world, edge);
            report.discarded += 1;
            return;
        }

        let key = PathKey::for_edge(edge);
        match result.outcome {
            SearchOutcome::Found(points) if points.len() >= 2 => {
                store.insert(key, PathStatus::Pending, PathGeometry::from_points(points));
                graph.set_edge_status(edge, EdgeStatus::Success);
                report.routed += 1;
            }
            outcome => {
                debug!("[{}] No route for {}: {:?}", self.world, edge, outcome);
                store.insert(key, PathStatus::Failed, PathGeometry::default());
                graph.set_edge_status(edge, EdgeStatus::Failure);
                report.failed += 1;
            }
        }
    }
}
