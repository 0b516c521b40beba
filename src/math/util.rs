use super::{Point2d, Vector2d};
use cgmath::prelude::*;

/// Tolerance used by the intersection and projection routines.
pub const EPS: f64 = 1e-7;

/// Tolerance used when comparing points produced by offsetting and splitting.
pub const ALMOST_EPS: f64 = 1e-4;

/// Rotates a vector 90 degrees anticlockwise.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Rotates a vector by the given angle in radians.
pub fn rotate(vec: Vector2d, angle: f64) -> Vector2d {
    let (s, c) = angle.sin_cos();
    Vector2d::new(c * vec.x - s * vec.y, s * vec.x + c * vec.y)
}

/// Normalises a vector, returning `None` if it is too short to have a direction.
pub fn try_normalize(vec: Vector2d) -> Option<Vector2d> {
    let mag = vec.magnitude();
    (mag > EPS).then(|| vec / mag)
}

/// Creates a unit vector pointing at the given angle.
pub fn from_angle(angle: f64) -> Vector2d {
    let (s, c) = angle.sin_cos();
    Vector2d::new(c, s)
}

/// Returns true if both coordinates of the points are within `eps` of each other.
pub fn almost_equal(a: Point2d, b: Point2d, eps: f64) -> bool {
    (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
}

/// Quantizes a point into a grid cell of the given size.
///
/// Points which are almost equal end up in the same or in a neighbouring cell,
/// which makes the cell a cheap hash key for deduplication.
pub fn bucket(point: Point2d, cell: f64) -> (i64, i64) {
    (
        (point.x / cell).floor() as i64,
        (point.y / cell).floor() as i64,
    )
}
