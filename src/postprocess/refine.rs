use bevy::math::{IVec2, IVec3, Vec3Swizzles};

use crate::terrain::TerrainOracle;

/// Integer line between two columns, both ends included, 8-connected
pub fn bresenham(from: IVec2, to: IVec2) -> Vec<IVec2> {
    let d = (to - from).abs();
    let step = (to - from).signum();
    let mut err = d.x - d.y;
    let mut at = from;
    let mut line = Vec::with_capacity(d.x.max(d.y) as usize + 1);

    loop {
        line.push(at);
        if at == to {
            return line;
        }
        let e2 = 2 * err;
        if e2 > -d.y {
            err -= d.y;
            at.x += step.x;
        }
        if e2 < d.x {
            err += d.x;
            at.y += step.y;
        }
    }
}

/// Fill every gap in a route with unit steps.
///
/// Original vertices keep their height; interpolated columns take the road
/// height from the terrain. Repeated columns are collapsed.
pub fn densify(points: &[IVec3], terrain: &dyn TerrainOracle) -> Vec<IVec3> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let mut out = vec![first];

    for pair in points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let line = bresenham(from.xz(), to.xz());
        let interior = line.len().saturating_sub(1);
        for column in &line[1..interior.max(1)] {
            out.push(terrain.road_point(column.x, column.y));
        }
        if out.last().map(|p| p.xz()) != Some(to.xz()) {
            out.push(to);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::HeightFnTerrain;

    fn is_unit_step(a: IVec2, b: IVec2) -> bool {
        let d = (b - a).abs();
        d.x <= 1 && d.y <= 1 && d != IVec2::ZERO
    }

    #[test]
    fn bresenham_covers_both_ends_with_unit_steps() {
        for to in [IVec2::new(7, 3), IVec2::new(-4, 9), IVec2::new(0, -5), IVec2::new(6, 6)] {
            let line = bresenham(IVec2::ZERO, to);
            assert_eq!(line.first(), Some(&IVec2::ZERO));
            assert_eq!(line.last(), Some(&to));
            assert_eq!(line.len() as i32, to.x.abs().max(to.y.abs()) + 1);
            assert!(line.windows(2).all(|w| is_unit_step(w[0], w[1])));
        }
        assert_eq!(bresenham(IVec2::ONE, IVec2::ONE), vec![IVec2::ONE]);
    }

    #[test]
    fn densify_samples_terrain_between_vertices() {
        let terrain = HeightFnTerrain::new(|x, _| 64 + x);
        let route = vec![IVec3::new(0, 100, 0), IVec3::new(4, 100, 2)];
        let dense = densify(&route, &terrain);

        assert_eq!(dense.len(), 5);
        assert_eq!(dense[0].y, 100);
        assert_eq!(dense[4].y, 100);
        assert!(dense[1..4].iter().all(|p| p.y == 64 + p.x));
    }

    #[test]
    fn densify_collapses_repeated_columns() {
        let terrain = HeightFnTerrain::flat(64);
        let route = vec![IVec3::new(0, 64, 0), IVec3::new(0, 64, 0), IVec3::new(1, 64, 0)];
        assert_eq!(densify(&route, &terrain).len(), 2);
    }
}
