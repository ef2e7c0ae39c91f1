use bevy::math::IVec3;

fn manhattan_xz(a: IVec3, b: IVec3) -> i32 {
    (a.x - b.x).abs() + (a.z - b.z).abs()
}

/// Drop the points hugging either end of a route.
///
/// Leading points closer than `radius` (Manhattan, XZ) to the first point and
/// trailing points closer than `radius` to the last one are removed. If fewer
/// than two points would survive, the route is returned untouched.
pub fn trim_endpoints(points: &[IVec3], radius: i32) -> Vec<IVec3> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return points.to_vec();
    };

    let start = points
        .iter()
        .position(|p| manhattan_xz(*p, first) >= radius)
        .unwrap_or(points.len());
    let end = points
        .iter()
        .rposition(|p| manhattan_xz(*p, last) >= radius)
        .map_or(0, |i| i + 1);

    if end <= start || end - start < 2 {
        return points.to_vec();
    }
    points[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::line_along_x;

    #[test]
    fn trims_both_ends() {
        let trimmed = trim_endpoints(&line_along_x(0, 64, 0, 20), 3);
        assert_eq!(trimmed.first().map(|p| p.x), Some(3));
        assert_eq!(trimmed.last().map(|p| p.x), Some(16));
    }

    #[test]
    fn zero_radius_keeps_everything() {
        let line = line_along_x(0, 64, 0, 5);
        assert_eq!(trim_endpoints(&line, 0), line);
    }

    #[test]
    fn short_routes_are_left_alone() {
        let line = line_along_x(0, 64, 0, 6);
        assert_eq!(trim_endpoints(&line, 3), line);
        assert_eq!(trim_endpoints(&[], 3), Vec::<IVec3>::new());
    }
}
