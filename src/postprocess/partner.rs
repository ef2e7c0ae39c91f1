//! Parallel partner search

use bevy::math::{IVec2, IVec3, Vec2, Vec3Swizzles};

use crate::keys::PathKey;
use crate::settings::MergeSettings;
use crate::types::PathGeometry;

/// Unsigned angle between two XZ directions, in degrees; `None` if either
/// direction is degenerate
pub fn angle_between_deg(a: IVec2, b: IVec2) -> Option<f32> {
    if a == IVec2::ZERO || b == IVec2::ZERO {
        return None;
    }
    let (a, b) = (a.as_vec2(), b.as_vec2());
    Some(a.perp_dot(b).abs().atan2(a.dot(b)).to_degrees())
}

/// Overall XZ direction of a route: last minus first
pub fn direction(points: &[IVec3]) -> IVec2 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => last.xz() - first.xz(),
        _ => IVec2::ZERO,
    }
}

pub fn distance_xz(a: IVec3, b: IVec3) -> f32 {
    Vec2::distance(a.xz().as_vec2(), b.xz().as_vec2())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: IVec2,
    max: IVec2,
}

impl Bounds {
    fn of(points: &[IVec3]) -> Option<Self> {
        let first = points.first()?.xz();
        Some(points.iter().fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, p| Bounds {
                min: b.min.min(p.xz()),
                max: b.max.max(p.xz()),
            },
        ))
    }

    fn inflated(self, by: i32) -> Self {
        Bounds {
            min: self.min - IVec2::splat(by),
            max: self.max + IVec2::splat(by),
        }
    }

    fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// A path judged parallel enough to merge with
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerMatch {
    pub key: PathKey,
    pub angle: f32,
    pub min_distance: f32,
    pub score: f32,
}

fn min_distance(a: &[IVec3], b: &[IVec3]) -> f32 {
    a.iter()
        .flat_map(|p| b.iter().map(move |q| distance_xz(*p, *q)))
        .fold(f32::INFINITY, f32::min)
}

/// Best partner for `active` among `candidates`, scored by
/// `angle + 0.5 * min_distance`. Earlier candidates win ties.
pub fn find_partner<'a>(
    active: &[IVec3],
    candidates: impl IntoIterator<Item = (&'a PathKey, &'a PathGeometry)>,
    settings: &MergeSettings,
) -> Option<PartnerMatch> {
    let bounds = Bounds::of(active)?.inflated(settings.parallel_tolerance.ceil() as i32);
    let heading = direction(active);

    let mut best: Option<PartnerMatch> = None;
    for (key, geometry) in candidates {
        let points = &geometry.points;
        let Some(other) = Bounds::of(points) else {
            continue;
        };
        if !bounds.overlaps(&other) {
            continue;
        }
        let Some(angle) = angle_between_deg(heading, direction(points)) else {
            continue;
        };
        if angle >= settings.parallel_angle_deg {
            continue;
        }
        let min_distance = min_distance(active, points);
        if min_distance >= settings.parallel_tolerance {
            continue;
        }

        let score = angle + 0.5 * min_distance;
        if best.as_ref().is_none_or(|b| score < b.score) {
            best = Some(PartnerMatch {
                key: key.clone(),
                angle,
                min_distance,
                score,
            });
        }
    }
    best
}
