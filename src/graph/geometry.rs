//! Exact integer segment tests in the XZ plane
//!
//! Coordinates are widened to `i64` before multiplying, so cross products stay
//! exact for any world within +-2^30 blocks of the origin.

use bevy::math::IVec3;

/// Sign of the turn a -> b -> c: positive counter-clockwise, negative clockwise
pub fn orientation(a: IVec3, b: IVec3, c: IVec3) -> i64 {
    let abx = b.x as i64 - a.x as i64;
    let abz = b.z as i64 - a.z as i64;
    let acx = c.x as i64 - a.x as i64;
    let acz = c.z as i64 - a.z as i64;
    (abx * acz - abz * acx).signum()
}

/// Whether `p` lies inside the bounding box of `a..b` (used once collinear)
fn within_bounds(a: IVec3, b: IVec3, p: IVec3) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.z >= a.z.min(b.z) && p.z <= a.z.max(b.z)
}

/// Whether segments `p1-p2` and `q1-q2` share any point in XZ.
///
/// Touching and collinear overlap count as crossing.
pub fn segments_cross(p1: IVec3, p2: IVec3, q1: IVec3, q2: IVec3) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && within_bounds(p1, p2, q1))
        || (o2 == 0 && within_bounds(p1, p2, q2))
        || (o3 == 0 && within_bounds(q1, q2, p1))
        || (o4 == 0 && within_bounds(q1, q2, p2))
}

/// Squared horizontal distance, widened
pub fn distance_squared_xz(a: IVec3, b: IVec3) -> i64 {
    let dx = b.x as i64 - a.x as i64;
    let dz = b.z as i64 - a.z as i64;
    dx * dx + dz * dz
}
