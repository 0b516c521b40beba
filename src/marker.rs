//! Rectangular triggers placed across the road.

use crate::envelope::Location;
use crate::math::{point_in_polygon, rot90, try_normalize, Point2d, Vector2d};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A transition of a tracked position across a [Marker].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarkerEvent {
    /// The position moved from outside to inside the marker.
    Enter,
    /// The position moved from inside to outside the marker.
    Leave,
}

/// A rectangle standing on a location, such as a start/finish line.
///
/// The rectangle spans `height` along its front direction, centred on the location,
/// and `width` anticlockwise of it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Marker {
    location: Location,
    width: f64,
    height: f64,
    front: Vector2d,
    polygon: [Point2d; 4],
}

impl Marker {
    /// Creates a marker.
    ///
    /// # Parameters
    /// * `location` - The location the marker stands on
    /// * `width` - The extent of the marker to the left of its front direction, in m
    /// * `height` - The extent of the marker along its direction, in m
    /// * `direction` - The front direction, defaulting to the direction of the location's segment
    pub fn new(location: Location, width: f64, height: f64, direction: Option<Vector2d>) -> Self {
        let front = direction
            .or_else(|| try_normalize(location.segment.vector()))
            .unwrap_or_else(Vector2d::unit_x);
        let p = location.point;
        let u = rot90(front) * width;
        let v = front * (0.5 * height);
        Self {
            location,
            width,
            height,
            front,
            polygon: [p + v + u, p - v + u, p - v, p + v],
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn front(&self) -> Vector2d {
        self.front
    }

    /// The corners of the marker.
    pub fn polygon(&self) -> &[Point2d; 4] {
        &self.polygon
    }

    /// Whether a point lies inside or on the edge of the marker.
    pub fn contains(&self, point: Point2d) -> bool {
        point_in_polygon(point, &self.polygon, false)
    }

    /// Checks whether a position moving from `prev` to `curr` entered or left the marker.
    pub fn crossing(&self, prev: Point2d, curr: Point2d) -> Option<MarkerEvent> {
        match (self.contains(prev), self.contains(curr)) {
            (false, true) => Some(MarkerEvent::Enter),
            (true, false) => Some(MarkerEvent::Leave),
            _ => None,
        }
    }
}
