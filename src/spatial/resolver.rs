//! Phase B: confirm candidates against the world on the authoritative thread

use std::collections::HashSet;

use bevy::math::IVec3;
use bevy::prelude::*;
use crossbeam_channel::Receiver;

use super::negative_cache::NegativeCache;
use super::planner::ScanPlan;
use super::{Probe, StructureOracle};
use crate::types::{ChunkPos, StructureKind};

/// A confirmed structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    pub position: IVec3,
    pub kind: StructureKind,
}

/// Hits of one resolved plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub plan_id: u64,
    pub origin: ChunkPos,
    pub hits: Vec<ScanHit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub candidates: usize,
    pub cached_empty: usize,
    pub probes: usize,
    pub forced: usize,
    pub hits: usize,
}

/// Single consumer of scan plans.
///
/// Needs `&mut self`, so two resolutions can never overlap.
pub struct ScanResolver {
    receiver: Receiver<ScanPlan>,
    negative: NegativeCache,
    last_stats: ResolveStats,
}

impl ScanResolver {
    pub(super) fn new(receiver: Receiver<ScanPlan>) -> Self {
        Self {
            receiver,
            negative: NegativeCache::default(),
            last_stats: ResolveStats::default(),
        }
    }

    pub fn negative_cache(&self) -> &NegativeCache {
        &self.negative
    }

    pub fn last_stats(&self) -> ResolveStats {
        self.last_stats
    }

    /// Resolve every plan waiting on the channel, in arrival order
    pub fn drain(&mut self, oracle: &dyn StructureOracle) -> Vec<ScanOutcome> {
        let plans: Vec<ScanPlan> = self.receiver.try_iter().collect();
        plans.iter().map(|plan| self.resolve(plan, oracle)).collect()
    }

    pub fn resolve(&mut self, plan: &ScanPlan, oracle: &dyn StructureOracle) -> ScanOutcome {
        let mut stats = ResolveStats::default();
        let mut hits = Vec::new();

        let seed = oracle.world_seed();
        if plan.seed != seed {
            warn!(
                "Dropping scan plan {} made for seed {} (world seed is {})",
                plan.id, plan.seed, seed
            );
            return ScanOutcome {
                plan_id: plan.id,
                origin: plan.origin,
                hits,
            };
        }
        self.negative.ensure_seed(seed);

        let mut seen_columns: HashSet<(i32, i32)> = HashSet::new();
        let mut forced: HashSet<ChunkPos> = HashSet::new();

        for candidate in &plan.candidates {
            stats.candidates += 1;
            if self.negative.contains(candidate.chunk, candidate.scheme) {
                stats.cached_empty += 1;
                continue;
            }

            let mut all_absent = true;
            for kind in &candidate.kinds {
                stats.probes += 1;
                let mut probe = oracle.probe(candidate.chunk, kind);
                if probe == Probe::Unknown {
                    if forced.insert(candidate.chunk) {
                        oracle.force_structures(candidate.chunk);
                        stats.forced += 1;
                    }
                    stats.probes += 1;
                    probe = oracle.probe(candidate.chunk, kind);
                }

                match probe {
                    Probe::Present(position) => {
                        all_absent = false;
                        if seen_columns.insert((position.x, position.z)) {
                            hits.push(ScanHit {
                                position,
                                kind: kind.clone(),
                            });
                        }
                    }
                    Probe::Absent => {}
                    Probe::Unknown => {
                        all_absent = false;
                        debug!(
                            "Structure {} still unknown in chunk {:?} after generation",
                            kind, candidate.chunk
                        );
                    }
                }
            }

            if all_absent {
                self.negative.insert(candidate.chunk, candidate.scheme);
            }
        }

        stats.hits = hits.len();
        debug!(
            "Scan plan {} around {:?}: {} candidates, {} cached empty, {} probes, {} forced, {} hits",
            plan.id,
            plan.origin,
            stats.candidates,
            stats.cached_empty,
            stats.probes,
            stats.forced,
            stats.hits
        );
        self.last_stats = stats;

        ScanOutcome {
            plan_id: plan.id,
            origin: plan.origin,
            hits,
        }
    }
}
