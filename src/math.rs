//! Mathematical structs and functions.

use cgmath::{Point2, Vector2};
pub use collision::{cast_ray_segments, collision_circle_segment};
pub use polygon::{point_in_polygon, point_on_segment, polygon_to_segments};
pub use segment::{
    break_segment, distance, distance_point_segment, intersect, nearest_point_segment,
    LineSegment2d,
};
pub use util::*;

mod collision;
mod polygon;
mod segment;
mod util;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;
