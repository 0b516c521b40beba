use crate::envelope::Envelope;
use crate::math::{
    distance, distance_point_segment, nearest_point_segment, try_normalize, LineSegment2d, Point2d,
    Vector2d,
};
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// The footprint of each house variant, in m.
pub const HOUSE_SIZES: [f64; 4] = [16.0, 16.0, 32.0, 32.0];

/// The footprint of each tree variant, in m.
pub const TREE_SIZES: [f64; 3] = [16.0, 16.0, 16.0];

/// The parameters of scenery placement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SceneryParams {
    /// The probability of a house on an eligible anchor.
    pub house_density: f64,
    /// Houses stand on anchors at least this far from the road edge, in m.
    pub house_distance: f64,
    /// The fraction of a house's size it keeps clear of other houses.
    pub house_real_estate: f64,
    /// The probability of a tree on an eligible anchor.
    pub tree_density: f64,
    /// Trees stand on anchors farther than this from the road edge, in m.
    /// Houses stand on anchors no farther than this.
    pub tree_distance: f64,
    /// The largest random offset of a tree from its anchor on each axis, in whole m.
    pub tree_jitter: i32,
}

impl Default for SceneryParams {
    fn default() -> Self {
        Self {
            house_density: 0.9,
            house_distance: 10.0,
            house_real_estate: 0.5,
            tree_density: 0.5,
            tree_distance: 25.0,
            tree_jitter: 5,
        }
    }
}

/// A house facing the road.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct House {
    pub position: Point2d,
    /// The angle of the road edge the house faces, in radians.
    pub angle: f64,
    /// An index into [HOUSE_SIZES].
    pub variant: usize,
    /// The driveway from the house to the road edge.
    pub path: Option<LineSegment2d>,
}

impl House {
    pub fn size(&self) -> f64 {
        HOUSE_SIZES[self.variant]
    }

    fn overlaps(&self, other: &House, real_estate: f64) -> bool {
        let r1 = self.size() * real_estate;
        let r2 = other.size() * real_estate;
        distance(self.position, other.position) < r1 + r2
    }
}

/// A tree away from the road.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tree {
    pub position: Point2d,
    /// The rotation in radians.
    pub angle: f64,
    /// An index into [TREE_SIZES].
    pub variant: usize,
}

impl Tree {
    pub fn size(&self) -> f64 {
        TREE_SIZES[self.variant]
    }
}

/// Finds the road edge nearest to a point, ignoring edges the point does not face.
fn nearest_border(point: Point2d, borders: &Envelope) -> Option<(f64, LineSegment2d)> {
    borders
        .segments()
        .iter()
        .map(|seg| (distance_point_segment(point, seg, false), *seg))
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

/// Places houses on the anchors lying in a band along the road edges.
pub(crate) fn place_houses(
    rng: &mut impl Rng,
    anchors: &[Point2d],
    borders: &Envelope,
    params: &SceneryParams,
) -> Vec<House> {
    let setback = 0.75 * params.house_distance + 0.25 * params.tree_distance;
    let mut houses: Vec<House> = vec![];

    for anchor in anchors {
        let (dist, seg) = match nearest_border(*anchor, borders) {
            Some(nearest) => nearest,
            None => continue,
        };
        if dist < params.house_distance
            || dist > params.tree_distance
            || !rng.gen_bool(params.house_density)
        {
            continue;
        }

        let mut house = House {
            position: *anchor,
            angle: seg.angle(),
            variant: rng.gen_range(0..HOUSE_SIZES.len()),
            path: None,
        };
        if let Some(path_end) = nearest_point_segment(*anchor, &seg, false) {
            let u = try_normalize(path_end - *anchor).unwrap_or_else(Vector2d::unit_x) * setback;
            house.position = path_end - u;
            house.path = Some(LineSegment2d::from_ends(house.position, path_end));
        }

        if !houses
            .iter()
            .any(|other| other.overlaps(&house, params.house_real_estate))
        {
            houses.push(house);
        }
    }

    houses
}

/// Places trees on the anchors far away from the road.
pub(crate) fn place_trees(
    rng: &mut impl Rng,
    anchors: &[Point2d],
    borders: &Envelope,
    params: &SceneryParams,
) -> Vec<Tree> {
    let jitter = params.tree_jitter;
    anchors
        .iter()
        .filter(|anchor| {
            borders
                .segments()
                .iter()
                .all(|seg| distance_point_segment(**anchor, seg, true) > params.tree_distance)
        })
        .filter_map(|anchor| {
            if !rng.gen_bool(params.tree_density) {
                return None;
            }
            let offset = Vector2d::new(
                rng.gen_range(-jitter..=jitter) as f64,
                rng.gen_range(-jitter..=jitter) as f64,
            );
            Some(Tree {
                position: *anchor + offset,
                angle: rng.gen::<f64>() * FRAC_PI_2,
                variant: rng.gen_range(0..TREE_SIZES.len()),
            })
        })
        .collect()
}
