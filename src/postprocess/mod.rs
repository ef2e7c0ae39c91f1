//! Post-processing of computed routes
//!
//! One invocation claims a PENDING path and repeatedly tries to fold a
//! near-parallel PENDING partner into it. Each successful merge finalizes two
//! legs ending at a junction and continues with the shared trunk as the new
//! active path. Whatever remains active at the end is finalized on its own.
//!
//! Finalizing means densifying to unit steps, normalizing the height profile,
//! classifying water, placing buoys and queueing build segments.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use bevy::math::{IVec2, IVec3, Vec3Swizzles};
use bevy::prelude::*;

use crate::build_queue::BuildQueue;
use crate::error::{Result, RoadNetworkError};
use crate::keys::PathKey;
use crate::settings::RoadNetworkSettings;
use crate::store::{Claim, PathStore};
use crate::tasks::WorkerPool;
use crate::terrain::TerrainOracle;
use crate::types::{PathGeometry, PathStatus};

pub mod convergence;
pub mod partner;
pub mod refine;
pub mod smoothing;
pub mod trim;
pub mod water;

pub use convergence::{Convergence, find_convergence};
pub use partner::{PartnerMatch, find_partner};
pub use smoothing::{NormalizationStats, normalize_heights};
pub use water::BuoyMark;

/// Everything an invocation reads or writes
#[derive(Clone, Copy)]
pub struct ProcessContext<'a> {
    pub world: &'a str,
    pub store: &'a PathStore,
    pub queue: &'a BuildQueue,
    pub terrain: &'a dyn TerrainOracle,
    pub settings: &'a RoadNetworkSettings,
}

/// What one invocation did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationReport {
    /// Paths that became READY, in the order they were finalized
    pub finalized: Vec<PathKey>,
    pub merges: usize,
    pub claim_conflicts: usize,
    pub normalization: NormalizationStats,
    pub buoys: usize,
    pub segments: usize,
}

/// Finished geometry of one path
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedPath {
    pub geometry: PathGeometry,
    pub buoys: Vec<BuoyMark>,
    pub normalization: NormalizationStats,
}

/// Densify, smooth and decorate a route
pub fn finalize_geometry(
    points: &[IVec3],
    terrain: &dyn TerrainOracle,
    settings: &RoadNetworkSettings,
) -> FinalizedPath {
    let mut points = refine::densify(points, terrain);

    let mut heights: Vec<i32> = points.iter().map(|p| p.y).collect();
    let normalization = normalize_heights(&mut heights, &settings.smoothing);
    for (point, height) in points.iter_mut().zip(heights) {
        point.y = height;
    }

    let water_mask = water::water_mask(&points, terrain);
    let buoys = water::place_buoys(&points, &water_mask, settings.water.buoy_interval);
    FinalizedPath {
        geometry: PathGeometry {
            buoys: buoys.iter().map(|b| b.position).collect(),
            points,
            water_mask,
        },
        buoys,
        normalization,
    }
}

/// The junction between two convergence vertices: their XZ midpoint at
/// terrain road height
pub fn junction(a: IVec3, b: IVec3, terrain: &dyn TerrainOracle) -> IVec3 {
    let mid = (a.xz() + b.xz()).div_euclid(IVec2::splat(2));
    terrain.road_point(mid.x, mid.y)
}

/// Result of splitting two converging routes at their junction
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSplit {
    pub junction: IVec3,
    pub active_leg: Vec<IVec3>,
    pub partner_leg: Vec<IVec3>,
    pub trunk: Vec<IVec3>,
    /// Whether the trunk follows the active route's tail
    pub trunk_from_active: bool,
}

/// Build two legs ending at the junction and one trunk starting there.
///
/// The trunk follows the longer of the two tails; on a tie the tail with the
/// smaller convergence index, then the active one.
pub fn split_at(
    active: &[IVec3],
    partner: &[IVec3],
    at: &Convergence,
    terrain: &dyn TerrainOracle,
) -> MergeSplit {
    let (i, j) = (at.active, at.partner);
    let junction = junction(active[i], partner[j], terrain);

    let leg = |route: &[IVec3], upto: usize| {
        let mut leg = route[..upto].to_vec();
        leg.push(junction);
        leg
    };

    let tail_a = &active[i + 1..];
    let tail_b = &partner[j + 1..];
    let trunk_from_active = match tail_a.len().cmp(&tail_b.len()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => i <= j,
    };

    let mut trunk = vec![junction];
    trunk.extend_from_slice(if trunk_from_active { tail_a } else { tail_b });

    MergeSplit {
        junction,
        active_leg: leg(active, i),
        partner_leg: leg(partner, j),
        trunk,
        trunk_from_active,
    }
}

pub struct PathPostProcessor;

impl PathPostProcessor {
    /// Claim the first PENDING path that nobody else holds and process it.
    ///
    /// Returns `None` when there was nothing to claim.
    pub fn run_once(ctx: ProcessContext<'_>) -> Option<InvocationReport> {
        let mut conflicts = 0;
        for key in ctx.store.pending_keys() {
            let Some(claim) = ctx.store.try_claim(&key, PathStatus::Failed) else {
                conflicts += 1;
                continue;
            };

            // Claims held by a panicking invocation roll back while unwinding
            let outcome = catch_unwind(AssertUnwindSafe(|| Self::process(ctx, claim)));
            let failure = match outcome {
                Ok(Ok(mut report)) => {
                    report.claim_conflicts += conflicts;
                    return Some(report);
                }
                Ok(Err(err)) => err.to_string(),
                Err(_) => "invocation panicked".to_string(),
            };
            error!("[{}] Post-processing of {} failed: {}", ctx.world, key, failure);
            return Some(InvocationReport {
                claim_conflicts: conflicts,
                ..InvocationReport::default()
            });
        }
        None
    }

    /// Run up to `invocations` invocations side by side on the pool
    pub fn run_batch(
        ctx: ProcessContext<'_>,
        pool: &WorkerPool,
        invocations: usize,
    ) -> Vec<InvocationReport> {
        pool.fan_out(0..invocations, |_| Self::run_once(ctx))
            .into_iter()
            .flatten()
            .collect()
    }

    /// Keep processing until no PENDING path is left
    pub fn run_until_idle(ctx: ProcessContext<'_>) -> Vec<InvocationReport> {
        std::iter::from_fn(|| Self::run_once(ctx)).collect()
    }

    /// Merge loop for one claimed path. Claims still held when this returns
    /// early are rolled back by their guards.
    fn process(ctx: ProcessContext<'_>, claim: Claim) -> Result<InvocationReport> {
        let merge = &ctx.settings.merge;
        let mut report = InvocationReport::default();
        let mut active = claim;
        let mut points = Self::prepared_points(&active, merge.trim_radius);
        let mut unavailable: HashSet<PathKey> = HashSet::new();

        for _ in 0..merge.max_iterations {
            let candidates: Vec<(PathKey, PathGeometry)> = ctx
                .store
                .pending_except(active.key())
                .into_iter()
                .filter(|(key, _)| !unavailable.contains(key))
                .collect();
            let Some(found) = find_partner(&points, candidates.iter().map(|(k, g)| (k, g)), merge)
            else {
                break;
            };

            let Some(partner) = ctx.store.try_claim(&found.key, PathStatus::Pending) else {
                debug!("[{}] Partner {} was claimed elsewhere", ctx.world, found.key);
                report.claim_conflicts += 1;
                unavailable.insert(found.key);
                continue;
            };
            let partner_points = Self::prepared_points(&partner, merge.trim_radius);

            let Some(at) = find_convergence(&points, &partner_points, merge) else {
                debug!(
                    "[{}] {} and {} never converge",
                    ctx.world,
                    active.key(),
                    partner.key()
                );
                partner.release();
                break;
            };

            let split = split_at(&points, &partner_points, &at, ctx.terrain);
            let trunk_key = if split.trunk_from_active {
                active.key().trunk(split.junction)
            } else {
                partner.key().trunk(split.junction)
            };
            if ctx.store.contains(&trunk_key) {
                return Err(RoadNetworkError::MergeAborted {
                    key: active.key().clone(),
                    reason: format!("trunk {trunk_key} already exists"),
                });
            }

            info!(
                "[{}] Merging {} and {} at {} into {}",
                ctx.world,
                active.key(),
                partner.key(),
                split.junction,
                trunk_key
            );
            let trunk = ctx.store.insert_claimed(
                trunk_key,
                PathGeometry::from_points(split.trunk.clone()),
                PathStatus::Failed,
            );
            Self::finalize(ctx, active, &split.active_leg, &mut report)?;
            Self::finalize(ctx, partner, &split.partner_leg, &mut report)?;

            report.merges += 1;
            active = trunk;
            points = split.trunk;
        }

        Self::finalize(ctx, active, &points, &mut report)?;
        Ok(report)
    }

    /// Stored points of a claimed path, with the ends trimmed for routes that
    /// start and end at structures
    fn prepared_points(claim: &Claim, trim_radius: i32) -> Vec<IVec3> {
        let points = claim.geometry().points;
        if claim.key().is_trunk() {
            points
        } else {
            trim::trim_endpoints(&points, trim_radius)
        }
    }

    fn finalize(
        ctx: ProcessContext<'_>,
        claim: Claim,
        points: &[IVec3],
        report: &mut InvocationReport,
    ) -> Result<()> {
        if points.len() < 2 {
            return Err(RoadNetworkError::MergeAborted {
                key: claim.key().clone(),
                reason: format!("only {} points left", points.len()),
            });
        }

        let finished = finalize_geometry(points, ctx.terrain, ctx.settings);
        let key = claim.key().clone();
        let segments = ctx.queue.enqueue_path(&key, &finished.geometry.points);

        debug!(
            "[{}] Finalized {}: {} points, {} buoys, {} segments",
            ctx.world,
            key,
            finished.geometry.points.len(),
            finished.buoys.len(),
            segments
        );
        report.normalization += finished.normalization;
        report.buoys += finished.buoys.len();
        report.segments += segments;
        claim.finish(PathStatus::Ready, finished.geometry);
        report.finalized.push(key);
        Ok(())
    }
}
