//! Two-phase structure search
//!
//! Phase A ([`ScanPlanner`]) enumerates candidate chunks from the placement
//! rules on the worker pool and sends a [`ScanPlan`] over a channel. Phase B
//! ([`ScanResolver`]) consumes plans on the authoritative thread, probing the
//! world and forcing generation only when a cheap probe is inconclusive.

use std::sync::Arc;

use bevy::math::IVec3;
use bevy::prelude::*;

use crate::tasks::WorkerPool;
use crate::types::{ChunkPos, StructureKind};

pub mod negative_cache;
pub mod placement;
pub mod planner;
pub mod resolver;
pub mod selector;

pub use negative_cache::NegativeCache;
pub use placement::{ConcentricRings, Placement, PlacementScheme, RandomSpread, RingCache, SpreadType};
pub use planner::{Candidate, PlanningCell, ScanPlan, ScanPlanner, planning_cells};
pub use resolver::{ResolveStats, ScanHit, ScanOutcome, ScanResolver};
pub use selector::{Selector, SelectorError, StructureRegistry, StructureSet};

/// Answer of a cheap presence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Present(IVec3),
    Absent,
    /// The chunk has not been generated far enough to tell
    Unknown,
}

/// World access needed by the resolver
pub trait StructureOracle: Send + Sync {
    fn world_seed(&self) -> u64;

    fn probe(&self, chunk: ChunkPos, kind: &StructureKind) -> Probe;

    /// Generate `chunk` up to the stage where structure starts are known
    fn force_structures(&self, chunk: ChunkPos);
}

/// Both scan phases joined by their channel
pub struct SpatialIndex {
    planner: ScanPlanner,
    resolver: ScanResolver,
    completed: Vec<ScanOutcome>,
}

impl SpatialIndex {
    pub fn new(registry: StructureRegistry) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            planner: ScanPlanner::new(Arc::new(registry), sender),
            resolver: ScanResolver::new(receiver),
            completed: Vec::new(),
        }
    }

    /// A producer handle that may be moved to other threads
    pub fn planner(&self) -> ScanPlanner {
        self.planner.clone()
    }

    pub fn resolver(&self) -> &ScanResolver {
        &self.resolver
    }

    /// Plan a scan and queue it for resolution. Returns the plan id, or `None`
    /// when no selector names a placeable structure.
    pub fn request<S: AsRef<str>>(
        &self,
        seed: u64,
        origin: IVec3,
        radius: i32,
        cell_radius: i32,
        selectors: &[S],
        pool: &WorkerPool,
    ) -> Option<u64> {
        let kinds = self.planner.registry().resolve_all(selectors);
        if kinds.is_empty() {
            warn!("Scan around {} has no usable selectors", origin);
            return None;
        }

        let plan = self.planner.plan(
            seed,
            ChunkPos::containing(origin),
            radius,
            cell_radius,
            &kinds,
            pool,
        );
        let id = plan.id;
        debug!("Planned scan {} with {} candidates", id, plan.candidates.len());
        self.planner.submit(plan).then_some(id)
    }

    /// Resolve every queued plan
    pub fn resolve_pending(&mut self, oracle: &dyn StructureOracle) -> Vec<ScanOutcome> {
        let mut outcomes = std::mem::take(&mut self.completed);
        outcomes.extend(self.resolver.drain(oracle));
        outcomes
    }

    /// Plan and resolve in one call.
    ///
    /// Outcomes of other plans resolved along the way are kept for the next
    /// [`Self::resolve_pending`].
    pub fn scan<S: AsRef<str>>(
        &mut self,
        origin: IVec3,
        radius: i32,
        cell_radius: i32,
        selectors: &[S],
        oracle: &dyn StructureOracle,
        pool: &WorkerPool,
    ) -> Vec<ScanHit> {
        let Some(id) = self.request(oracle.world_seed(), origin, radius, cell_radius, selectors, pool)
        else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        for outcome in self.resolve_pending(oracle) {
            if outcome.plan_id == id {
                hits = outcome.hits;
            } else {
                self.completed.push(outcome);
            }
        }
        hits
    }
}
