//! Water classification and buoy placement

use bevy::math::IVec3;

use super::partner::distance_xz;
use crate::terrain::TerrainOracle;

/// A buoy and where along its submerged run it sits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuoyMark {
    /// Index of the route point carrying the buoy
    pub index: usize,
    /// Arc length from the start of the run
    pub offset: f32,
    pub position: IVec3,
}

/// A column is fully submerged when it and its 8 neighbours are under water
pub fn fully_submerged(terrain: &dyn TerrainOracle, x: i32, z: i32) -> bool {
    (-1..=1).all(|dx| (-1..=1).all(|dz| terrain.is_underwater(x + dx, z + dz)))
}

/// Parallel mask of fully submerged points
pub fn water_mask(points: &[IVec3], terrain: &dyn TerrainOracle) -> Vec<bool> {
    points
        .iter()
        .map(|p| fully_submerged(terrain, p.x, p.z))
        .collect()
}

/// Place a buoy every `interval` of arc length inside each submerged run.
/// The distance counter starts over at the beginning of every run.
pub fn place_buoys(points: &[IVec3], mask: &[bool], interval: f32) -> Vec<BuoyMark> {
    let mut buoys = Vec::new();
    if interval <= 0.0 {
        return buoys;
    }

    let mut run: Option<(f32, f32)> = None; // (arc length, next buoy at)
    for (index, point) in points.iter().enumerate() {
        if !mask.get(index).copied().unwrap_or(false) {
            run = None;
            continue;
        }
        let Some((length, next)) = run.as_mut() else {
            run = Some((0.0, interval));
            continue;
        };

        *length += distance_xz(points[index - 1], *point);
        while *length >= *next {
            buoys.push(BuoyMark {
                index,
                offset: *next,
                position: *point,
            });
            *next += interval;
        }
    }
    buoys
}
