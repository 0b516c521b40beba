use super::{almost_equal, Point2d, Vector2d, ALMOST_EPS, EPS};
use crate::util::Interval;
use cgmath::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// A straight line segment between two points.
///
/// Equality is undirected: a segment is equal to its reverse.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineSegment2d {
    pub start: Point2d,
    pub end: Point2d,
}

impl LineSegment2d {
    /// Creates a line segment from its two end points.
    pub const fn from_ends(start: Point2d, end: Point2d) -> Self {
        Self { start, end }
    }

    /// The length of the segment.
    pub fn length(&self) -> f64 {
        distance(self.start, self.end)
    }

    /// The point halfway between the two ends.
    pub fn midpoint(&self) -> Point2d {
        self.lerp(0.5)
    }

    /// The angle of the segment direction in radians.
    pub fn angle(&self) -> f64 {
        let v = self.end - self.start;
        v.y.atan2(v.x)
    }

    /// The vector from `start` to `end`.
    pub fn vector(&self) -> Vector2d {
        self.end - self.start
    }

    /// Linearly interpolates between the two ends.
    pub fn lerp(&self, t: f64) -> Point2d {
        self.start + (self.end - self.start) * t
    }

    /// The end point closest to `point`.
    pub fn closest_end(&self, point: Point2d) -> Point2d {
        if distance(point, self.start) < distance(point, self.end) {
            self.start
        } else {
            self.end
        }
    }

    /// The end point farthest from `point`.
    pub fn farthest_end(&self, point: Point2d) -> Point2d {
        if distance(point, self.start) < distance(point, self.end) {
            self.end
        } else {
            self.start
        }
    }

    /// Returns true if the ends of both segments are almost equal, in either direction.
    pub fn almost_eq(&self, other: &Self, eps: f64) -> bool {
        (almost_equal(self.start, other.start, eps) && almost_equal(self.end, other.end, eps))
            || (almost_equal(self.start, other.end, eps)
                && almost_equal(self.end, other.start, eps))
    }

    /// Returns true if both ends are almost the same point.
    pub fn is_degenerate(&self, eps: f64) -> bool {
        almost_equal(self.start, self.end, eps)
    }

    /// The horizontal and vertical extents of the segment.
    pub fn bounds(&self) -> [Interval<f64>; 2] {
        [
            Interval::new(self.start.x.min(self.end.x), self.start.x.max(self.end.x)),
            Interval::new(self.start.y.min(self.end.y), self.start.y.max(self.end.y)),
        ]
    }
}

impl PartialEq for LineSegment2d {
    fn eq(&self, other: &Self) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }
}

/// The distance between two points.
pub fn distance(p1: Point2d, p2: Point2d) -> f64 {
    p1.distance(p2)
}

/// Projects `point` onto the line through `seg`, returning the projection's
/// distance from `seg.start` along with the unit direction and the segment length.
fn project(point: Point2d, seg: &LineSegment2d) -> (f64, Vector2d, f64) {
    let v = seg.end - seg.start;
    let len = v.magnitude();
    let dir = v / (len + EPS);
    ((point - seg.start).dot(dir), dir, len)
}

/// Computes the distance between a point and a segment.
///
/// If the projection of the point falls outside the segment, returns the distance
/// to the nearest end when `clamp` is set, otherwise `f64::INFINITY`.
pub fn distance_point_segment(point: Point2d, seg: &LineSegment2d, clamp: bool) -> f64 {
    match nearest_point_segment(point, seg, clamp) {
        Some(nearest) => distance(point, nearest),
        None => f64::INFINITY,
    }
}

/// Finds the point of a segment nearest to `point`.
///
/// If the projection of the point falls outside the segment, returns the nearest end
/// when `clamp` is set, otherwise `None`.
pub fn nearest_point_segment(point: Point2d, seg: &LineSegment2d, clamp: bool) -> Option<Point2d> {
    let (x, dir, len) = project(point, seg);
    if x < 0.0 {
        clamp.then_some(seg.start)
    } else if x > len {
        clamp.then_some(seg.end)
    } else {
        Some(seg.start + dir * x)
    }
}

/// Finds the intersection of two segments, if there is one.
/// Parallel and collinear segments never intersect.
///
/// When `strict` is set, an intersection lying within `EPS` (in parametric terms)
/// of either end of either segment is not reported. This prevents segments which
/// were just split at a point from intersecting again at that point.
pub fn intersect(a: &LineSegment2d, b: &LineSegment2d, strict: bool) -> Option<Point2d> {
    let (x1, y1) = (a.start.x, a.start.y);
    let (x2, y2) = (a.end.x, a.end.y);
    let (x3, y3) = (b.start.x, b.start.y);
    let (x4, y4) = (b.end.x, b.end.y);

    // Segments within EPS radians of parallel never intersect
    let det = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if det.abs() <= EPS * a.length() * b.length() {
        return None;
    }

    let tol = if strict { 0.5 - EPS } else { 0.5 };
    let u = -((x1 - x2) * (y1 - y3) - (y1 - y2) * (x1 - x3)) / det;
    if (u - 0.5).abs() > tol {
        return None;
    }
    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / det;
    if (t - 0.5).abs() > tol {
        return None;
    }

    Some(a.lerp(t))
}

/// Splits `target` where `cutter` crosses its interior.
///
/// Returns the two pieces, or `target` itself if the segments do not cross or
/// only touch at one of the ends of `target`.
pub fn break_segment(
    cutter: &LineSegment2d,
    target: &LineSegment2d,
) -> SmallVec<[LineSegment2d; 2]> {
    match intersect(cutter, target, false) {
        Some(p)
            if !almost_equal(target.start, p, ALMOST_EPS)
                && !almost_equal(target.end, p, ALMOST_EPS) =>
        {
            smallvec![
                LineSegment2d::from_ends(target.start, p),
                LineSegment2d::from_ends(p, target.end),
            ]
        }
        _ => smallvec![*target],
    }
}
