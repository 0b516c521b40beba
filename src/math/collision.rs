use super::{distance, intersect, nearest_point_segment, LineSegment2d, Point2d, Vector2d, EPS};
use cgmath::prelude::*;

/// Computes the vector which pushes a circle out of a segment it overlaps.
///
/// Returns `None` if the circle does not touch the segment.
pub fn collision_circle_segment(
    centre: Point2d,
    radius: f64,
    seg: &LineSegment2d,
) -> Option<Vector2d> {
    let nearest = nearest_point_segment(centre, seg, true)?;
    let w = centre - nearest;
    let w_len = w.magnitude();
    (w_len <= radius).then(|| w * (radius - w_len + EPS) / (w_len + EPS))
}

/// Casts a ray against a set of segments.
///
/// Returns the segment from `origin` to the hit point, or to the end of the ray
/// if nothing is hit. When `first_hit_only` is set, the first segment hit wins,
/// which is only correct if the candidates are sorted by distance.
pub fn cast_ray_segments<'a>(
    origin: Point2d,
    direction: Vector2d,
    max_len: f64,
    candidates: impl IntoIterator<Item = &'a LineSegment2d>,
    first_hit_only: bool,
) -> LineSegment2d {
    let target = origin + direction * max_len;
    let ray = LineSegment2d::from_ends(origin, target);
    let mut hits = candidates
        .into_iter()
        .filter_map(|seg| intersect(&ray, seg, false));

    let hit = if first_hit_only {
        hits.next()
    } else {
        hits.min_by(|a, b| distance(origin, *a).total_cmp(&distance(origin, *b)))
    };

    LineSegment2d::from_ends(origin, hit.unwrap_or(target))
}
