//! Phase A: enumerate candidate chunks on the worker pool

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;

use super::placement::{Placement, PlacementScheme, RingCache};
use super::selector::StructureRegistry;
use crate::tasks::WorkerPool;
use crate::types::{ChunkPos, StructureKind};

/// A chunk that may hold one of `kinds`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub chunk: ChunkPos,
    /// Squared distance to the centre of the planning cell, in chunks
    pub distance_sq: i64,
    pub scheme: PlacementScheme,
    pub kinds: BTreeSet<StructureKind>,
}

/// Output of one planning pass, handed to the resolver
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub id: u64,
    pub seed: u64,
    pub origin: ChunkPos,
    pub candidates: Vec<Candidate>,
}

/// Square of chunks `min..=max` planned as one job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningCell {
    pub min: ChunkPos,
    pub max: ChunkPos,
    pub center: ChunkPos,
}

impl PlanningCell {
    fn contains(&self, chunk: ChunkPos) -> bool {
        (self.min.x..=self.max.x).contains(&chunk.x) && (self.min.z..=self.max.z).contains(&chunk.z)
    }
}

/// Tile the square of half-size `radius` around `origin` with cells of side
/// `2 * cell_radius + 1`, clipping the outer cells
pub fn planning_cells(origin: ChunkPos, radius: i32, cell_radius: i32) -> Vec<PlanningCell> {
    let side = 2 * cell_radius.max(0) + 1;
    let (lo_x, hi_x) = (origin.x - radius, origin.x + radius);
    let (lo_z, hi_z) = (origin.z - radius, origin.z + radius);

    let mut cells = Vec::new();
    let mut x = lo_x;
    while x <= hi_x {
        let mut z = lo_z;
        while z <= hi_z {
            cells.push(PlanningCell {
                min: ChunkPos::new(x, z),
                max: ChunkPos::new((x + side - 1).min(hi_x), (z + side - 1).min(hi_z)),
                center: ChunkPos::new(x + side / 2, z + side / 2),
            });
            z += side;
        }
        x += side;
    }
    cells
}

/// Producer side of the scan channel; cheap to clone
#[derive(Clone)]
pub struct ScanPlanner {
    registry: Arc<StructureRegistry>,
    rings: Arc<RingCache>,
    sender: Sender<ScanPlan>,
    next_id: Arc<AtomicU64>,
}

impl ScanPlanner {
    pub(super) fn new(registry: Arc<StructureRegistry>, sender: Sender<ScanPlan>) -> Self {
        Self {
            registry,
            rings: Arc::new(RingCache::default()),
            sender,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn registry(&self) -> &StructureRegistry {
        &self.registry
    }

    pub fn ring_cache(&self) -> &RingCache {
        &self.rings
    }

    /// Enumerate candidates for `kinds` around `origin`, one pool job per cell.
    ///
    /// Candidates found by several structure sets with the same scheme are
    /// merged; the result is ordered by distance to the cell centre.
    pub fn plan(
        &self,
        seed: u64,
        origin: ChunkPos,
        radius: i32,
        cell_radius: i32,
        kinds: &BTreeSet<StructureKind>,
        pool: &WorkerPool,
    ) -> ScanPlan {
        let cells = planning_cells(origin, radius, cell_radius);
        let per_cell = pool.fan_out(cells, |cell| self.plan_cell(seed, cell, kinds));

        let mut merged: BTreeMap<(ChunkPos, PlacementScheme), Candidate> = BTreeMap::new();
        for candidate in per_cell.into_iter().flatten() {
            merged
                .entry((candidate.chunk, candidate.scheme))
                .and_modify(|existing| existing.kinds.extend(candidate.kinds.iter().cloned()))
                .or_insert(candidate);
        }

        let mut candidates: Vec<Candidate> = merged.into_values().collect();
        candidates.sort_by(|a, b| {
            a.distance_sq
                .cmp(&b.distance_sq)
                .then(a.chunk.cmp(&b.chunk))
                .then(a.scheme.cmp(&b.scheme))
        });

        ScanPlan {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            seed,
            origin,
            candidates,
        }
    }

    fn plan_cell(
        &self,
        seed: u64,
        cell: PlanningCell,
        kinds: &BTreeSet<StructureKind>,
    ) -> Vec<Candidate> {
        let mut out = Vec::new();
        for set in self.registry.sets() {
            let wanted: BTreeSet<StructureKind> =
                set.kinds.iter().filter(|k| kinds.contains(*k)).cloned().collect();
            if wanted.is_empty() {
                continue;
            }

            let chunks = match &set.placement {
                Placement::RandomSpread(spread) => spread.candidates_in(seed, cell.min, cell.max),
                Placement::ConcentricRings(rings) => self
                    .rings
                    .layout(seed, &set.name, rings)
                    .iter()
                    .copied()
                    .filter(|chunk| cell.contains(*chunk))
                    .collect(),
            };

            out.extend(chunks.into_iter().map(|chunk| Candidate {
                chunk,
                distance_sq: chunk.distance_squared(cell.center),
                scheme: set.placement.scheme(),
                kinds: wanted.clone(),
            }));
        }
        out
    }

    /// Hand a plan to the resolver; false once the resolver is gone
    pub fn submit(&self, plan: ScanPlan) -> bool {
        self.sender.send(plan).is_ok()
    }
}
