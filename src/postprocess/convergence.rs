//! Convergence point between two parallel routes

use bevy::math::IVec3;

use super::partner::{angle_between_deg, direction, distance_xz};
use crate::constants::TAIL_SAMPLES;
use crate::settings::MergeSettings;

/// Vertex pair where two routes start running together
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    /// Index into the active route
    pub active: usize,
    /// Index into the partner route
    pub partner: usize,
    pub tail_angle: f32,
    pub tail_distance: f32,
    pub score: f32,
}

/// Mean XZ distance between the two tails, sampled at up to
/// [`TAIL_SAMPLES`] evenly spaced corresponding indices
pub fn tail_average_distance(a: &[IVec3], b: &[IVec3]) -> Option<f32> {
    let samples = TAIL_SAMPLES.min(a.len()).min(b.len());
    if samples == 0 {
        return None;
    }
    let at = |len: usize, s: usize| {
        if samples == 1 { 0 } else { s * (len - 1) / (samples - 1) }
    };
    let total: f32 = (0..samples)
        .map(|s| distance_xz(a[at(a.len(), s)], b[at(b.len(), s)]))
        .sum();
    Some(total / samples as f32)
}

/// Scores closer than this count as a tie
const SCORE_EPSILON: f32 = 1e-4;

/// Best interior vertex pair `(i, j)` minimising
/// `tail_angle + tail_average_distance / 10`.
///
/// Tails are the suffixes starting at `i` and `j`. A pair only qualifies when
/// its tail angle, tail distance and score are all under their caps. Among
/// pairs tied on the best score, the middle one in `(i, j)` order wins, so
/// routes that run together along their whole length meet halfway.
pub fn find_convergence(
    active: &[IVec3],
    partner: &[IVec3],
    settings: &MergeSettings,
) -> Option<Convergence> {
    let max_distance = settings.tail_distance_factor * settings.parallel_tolerance;
    let mut qualifying: Vec<Convergence> = Vec::new();

    for i in 1..active.len().saturating_sub(1) {
        let tail_a = &active[i..];
        let heading_a = direction(tail_a);
        for j in 1..partner.len().saturating_sub(1) {
            let tail_b = &partner[j..];
            let Some(tail_angle) = angle_between_deg(heading_a, direction(tail_b)) else {
                continue;
            };
            if tail_angle >= settings.tail_angle_deg {
                continue;
            }
            let Some(tail_distance) = tail_average_distance(tail_a, tail_b) else {
                continue;
            };
            if tail_distance >= max_distance {
                continue;
            }
            let score = tail_angle + tail_distance / 10.0;
            if score >= settings.score_cap {
                continue;
            }
            qualifying.push(Convergence {
                active: i,
                partner: j,
                tail_angle,
                tail_distance,
                score,
            });
        }
    }

    let best = qualifying
        .iter()
        .map(|c| c.score)
        .fold(f32::INFINITY, f32::min);
    let tied: Vec<Convergence> = qualifying
        .into_iter()
        .filter(|c| c.score - best <= SCORE_EPSILON)
        .collect();
    tied.get(tied.len() / 2).copied()
}
