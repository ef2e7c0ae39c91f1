//! Height profile normalization

use std::ops::AddAssign;

use crate::settings::SmoothingSettings;

/// How often each filter changed a height
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    pub median_changes: usize,
    pub clamped: usize,
    pub despiked: usize,
}

impl AddAssign for NormalizationStats {
    fn add_assign(&mut self, other: Self) {
        self.median_changes += other.median_changes;
        self.clamped += other.clamped;
        self.despiked += other.despiked;
    }
}

/// Median over an odd window, shrunk symmetrically near the ends so the end
/// heights never move. Reads from the unfiltered input.
pub fn median_filter(heights: &mut [i32], window: usize) -> usize {
    let half = window / 2;
    let source = heights.to_vec();
    let n = source.len();
    let mut changed = 0;
    let mut scratch = Vec::with_capacity(window.max(1));

    for k in 0..n {
        let r = half.min(k).min(n - 1 - k);
        scratch.clear();
        scratch.extend_from_slice(&source[k - r..=k + r]);
        scratch.sort_unstable();
        let median = scratch[r];
        if heights[k] != median {
            heights[k] = median;
            changed += 1;
        }
    }
    changed
}

/// Cap the step between neighbours at `max_step`, sweeping forwards then
/// backwards
pub fn clamp_gradient(heights: &mut [i32], max_step: i32) -> usize {
    let max_step = max_step.max(0);
    let mut clamped = 0;
    let mut clamp = |target: &mut i32, reference: i32| {
        let limited = (*target).clamp(reference - max_step, reference + max_step);
        if limited != *target {
            *target = limited;
            clamped += 1;
        }
    };

    for k in 1..heights.len() {
        let reference = heights[k - 1];
        clamp(&mut heights[k], reference);
    }
    for k in (0..heights.len().saturating_sub(1)).rev() {
        let reference = heights[k + 1];
        clamp(&mut heights[k], reference);
    }
    clamped
}

/// Replace interior points standing at least `delta` above both neighbours
/// with the neighbours' average
pub fn despike(heights: &mut [i32], delta: i32) -> usize {
    let mut despiked = 0;
    for k in 1..heights.len().saturating_sub(1) {
        let (prev, next) = (heights[k - 1], heights[k + 1]);
        if heights[k] - prev >= delta && heights[k] - next >= delta {
            heights[k] = (prev + next).div_euclid(2);
            despiked += 1;
        }
    }
    despiked
}

/// Run the configured number of median, clamp and despike passes
pub fn normalize_heights(heights: &mut [i32], settings: &SmoothingSettings) -> NormalizationStats {
    let mut stats = NormalizationStats::default();
    for _ in 0..settings.passes {
        stats.median_changes += median_filter(heights, settings.median_window);
        stats.clamped += clamp_gradient(heights, settings.max_gradient);
        stats.despiked += despike(heights, settings.spike_delta);
    }
    stats
}
