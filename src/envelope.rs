//! Road envelopes: the drivable boundary around a set of centre lines.

use crate::math::{distance, nearest_point_segment, LineSegment2d, Point2d};
use crate::util::Interval;
pub use generate::{
    build_corridor, build_envelope, edge_envelope, EnvelopeParams, Progress, CORRIDOR_STAGES,
    ENVELOPE_STAGES,
};
use rand::seq::SliceRandom;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod generate;

/// A position along the skeleton of an [Envelope].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    /// The skeleton segment.
    pub segment: LineSegment2d,
    /// The point on or near the segment.
    pub point: Point2d,
}

/// The boundary of a road network or corridor, along with its centre lines.
///
/// Envelopes compare by identity: two envelopes are never equal
/// even if they are geometrically identical.
#[derive(Debug)]
pub struct Envelope {
    /// The closed boundary, in no particular order.
    segments: Vec<LineSegment2d>,
    /// The centre lines the envelope was generated from, in path order.
    skeleton: Vec<LineSegment2d>,
    /// The road width in m.
    width: f64,
}

impl Envelope {
    pub(crate) fn new(
        segments: Vec<LineSegment2d>,
        skeleton: Vec<LineSegment2d>,
        width: f64,
    ) -> Self {
        Self {
            segments,
            skeleton,
            width,
        }
    }

    /// The boundary segments.
    pub fn segments(&self) -> &[LineSegment2d] {
        &self.segments
    }

    /// The centre line segments.
    pub fn skeleton(&self) -> &[LineSegment2d] {
        &self.skeleton
    }

    /// The road width in m.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The start point of every boundary segment.
    ///
    /// For an envelope around a single edge, this is the boundary polygon.
    pub fn points(&self) -> impl Iterator<Item = Point2d> + '_ {
        self.segments.iter().map(|seg| seg.start)
    }

    /// The axis aligned bounding box of the boundary.
    pub fn bounds(&self) -> Option<[Interval<f64>; 2]> {
        self.segments
            .iter()
            .map(LineSegment2d::bounds)
            .reduce(|[ax, ay], [bx, by]| [ax.union(&bx), ay.union(&by)])
    }

    /// Finds the location on the skeleton nearest to a point.
    pub fn nearest_location(&self, point: Point2d) -> Location {
        self.skeleton
            .iter()
            .filter_map(|seg| {
                let nearest = nearest_point_segment(point, seg, true)?;
                Some(Location {
                    segment: *seg,
                    point: nearest,
                })
            })
            .min_by(|a, b| distance(point, a.point).total_cmp(&distance(point, b.point)))
            .expect("Envelope skeleton is never empty")
    }

    /// Picks a uniformly random location along a random skeleton segment.
    pub fn random_location(&self, rng: &mut impl Rng) -> Location {
        let segment = *self
            .skeleton
            .choose(rng)
            .expect("Envelope skeleton is never empty");
        Location {
            segment,
            point: segment.lerp(rng.gen::<f64>()),
        }
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
