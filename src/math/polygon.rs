use super::{LineSegment2d, Point2d, EPS};

/// Returns true if the point lies on the segment.
pub fn point_on_segment(point: Point2d, seg: &LineSegment2d) -> bool {
    let [xs, ys] = seg.bounds();
    if !xs.contains(point.x) || !ys.contains(point.y) {
        return false;
    }
    let cross = seg.vector().perp_dot(point - seg.start);
    cross.abs() <= EPS * seg.length().max(1.0)
}

/// Determines whether a point is inside a polygon using the ray crossing algorithm.
///
/// A point lying on the boundary of the polygon is considered outside
/// if `strict` is set, and inside otherwise.
pub fn point_in_polygon(point: Point2d, polygon: &[Point2d], strict: bool) -> bool {
    let n = polygon.len();
    if n == 0 {
        return false;
    }

    let (x, y) = (point.x, point.y);
    let mut inside = false;
    let mut p1 = polygon[0];
    for i in 1..=n {
        let p2 = polygon[i % n];

        if point_on_segment(point, &LineSegment2d::from_ends(p1, p2)) {
            return !strict;
        }

        if p1.y.min(p2.y) < y && y <= p1.y.max(p2.y) && x <= p1.x.max(p2.x) {
            let x_inters = p1.x + (y - p1.y) / (p2.y - p1.y) * (p2.x - p1.x);
            if p1.x == p2.x || x < x_inters {
                inside = !inside;
            }
        }
        p1 = p2;
    }

    inside
}

/// Converts a closed polygon into its edges.
pub fn polygon_to_segments(polygon: &[Point2d]) -> Vec<LineSegment2d> {
    let n = polygon.len();
    (0..n)
        .map(|i| LineSegment2d::from_ends(polygon[i], polygon[(i + 1) % n]))
        .collect()
}
