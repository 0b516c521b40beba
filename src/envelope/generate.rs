use super::Envelope;
use crate::graph::SpatialGraph;
use crate::math::{
    break_segment, bucket, point_in_polygon, polygon_to_segments, LineSegment2d, Point2d,
    Vector2d, ALMOST_EPS, EPS,
};
use crate::util::Interval;
use itertools::{iproduct, Itertools};
use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The size of the grid cells used to find duplicate boundary segments, in m.
const DEDUP_CELL: f64 = 1.0;

/// The number of progress stages of [build_envelope].
pub const ENVELOPE_STAGES: usize = 4;

/// The number of progress stages of [build_corridor].
pub const CORRIDOR_STAGES: usize = 3;

/// The parameters of envelope generation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvelopeParams {
    /// The road width in m.
    pub width: f64,
    /// The number of slices in the semicircular cap at each end of a road.
    pub slices: usize,
    /// The extents of the world on both axes, in m.
    pub bounds: Interval<f64>,
    /// The spacing of the anchor grid in m.
    pub anchor_step: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            width: 10.0,
            slices: 10,
            bounds: Interval::new(-500.0, 500.0),
            anchor_step: 20.0,
        }
    }
}

/// A progress counter which can be polled from another thread.
#[derive(Debug, Default)]
pub struct Progress {
    completed: AtomicUsize,
    total: usize,
}

impl Progress {
    /// Creates a progress counter for the given number of stages.
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// The number of stages completed so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    /// The fraction of stages completed, between 0 and 1.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        f64::min(self.completed() as f64 / self.total as f64, 1.0)
    }

    /// Marks a stage as complete.
    pub(crate) fn advance(&self) {
        self.completed.fetch_add(1, Ordering::AcqRel);
    }
}

/// The envelope around a single edge, as it moves through the pipeline.
struct EdgeEnvelope {
    skeleton: LineSegment2d,
    boundary: Vec<LineSegment2d>,
    polygon: Vec<Point2d>,
    bounds: [Interval<f64>; 2],
}

impl EdgeEnvelope {
    fn new(skeleton: LineSegment2d, width: f64, slices: usize) -> Self {
        let polygon = offset_polygon(&skeleton, width, slices);
        let boundary = polygon_to_segments(&polygon);
        let bounds = skeleton.bounds().map(|range| range.expand(0.5 * width));
        Self {
            skeleton,
            boundary,
            polygon,
            bounds,
        }
    }

    fn set_boundary(&mut self, boundary: Vec<LineSegment2d>) {
        self.polygon = boundary.iter().map(|seg| seg.start).collect();
        self.boundary = boundary;
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.bounds[0].overlaps(&other.bounds[0]) && self.bounds[1].overlaps(&other.bounds[1])
    }

    fn contains(&self, point: Point2d, strict: bool) -> bool {
        self.bounds[0].contains(point.x)
            && self.bounds[1].contains(point.y)
            && point_in_polygon(point, &self.polygon, strict)
    }
}

/// Builds the closed "sausage" polygon around a road centre line: both sides offset
/// by half the road width, with a semicircular fan of `slices` at each end.
fn offset_polygon(skeleton: &LineSegment2d, width: f64, slices: usize) -> Vec<Point2d> {
    let (p1, p2) = (skeleton.start, skeleton.end);
    let v = skeleton.vector() / (skeleton.length() + EPS);
    let h = 0.5 * width;
    let left = Vector2d::new(-v.y, v.x) * h;

    let fan = move |centre: Point2d, start: f64| {
        (1..slices).map(move |i| {
            let (s, c) = (start - PI * i as f64 / slices as f64).sin_cos();
            centre + Vector2d::new(c, s) * h
        })
    };

    let mut points = Vec::with_capacity(2 * slices + 2);
    points.push(p1 + left);
    points.push(p2 + left);
    points.extend(fan(p2, v.x.atan2(-v.y)));
    points.push(p2 - left);
    points.push(p1 - left);
    points.extend(fan(p1, (-v.x).atan2(v.y)));
    points
}

/// Creates the envelope around a single road centre line.
pub fn edge_envelope(skeleton: LineSegment2d, width: f64, slices: usize) -> Envelope {
    let piece = EdgeEnvelope::new(skeleton, width, slices);
    Envelope::new(piece.boundary, vec![skeleton], width)
}

/// Lays a grid over the world and keeps the points outside every road.
fn generate_anchors(pieces: &[EdgeEnvelope], bounds: Interval<f64>, step: f64) -> Vec<Point2d> {
    let n = (bounds.length() / step).floor() as usize;
    iproduct!(0..=n, 0..=n)
        .map(|(i, j)| Point2d::new(bounds.min + j as f64 * step, bounds.min + i as f64 * step))
        .filter(|point| !pieces.iter().any(|piece| piece.contains(*point, true)))
        .collect()
}

/// Splits every segment of `boundary` wherever one of the `cutters` crosses it.
fn break_boundary(boundary: &[LineSegment2d], cutters: &[LineSegment2d]) -> Vec<LineSegment2d> {
    cutters.iter().fold(boundary.to_vec(), |segments, cutter| {
        segments
            .iter()
            .flat_map(|seg| break_segment(cutter, seg))
            .collect()
    })
}

/// Breaks the boundaries of every pair of envelopes against each other.
fn break_envelopes(pieces: &mut [EdgeEnvelope]) {
    for (i, j) in (0..pieces.len()).tuple_combinations() {
        let (head, tail) = pieces.split_at_mut(j);
        let (a, b) = (&mut head[i], &mut tail[0]);
        if !a.overlaps(b) {
            continue;
        }
        let broken_a = break_boundary(&a.boundary, &b.boundary);
        let broken_b = break_boundary(&b.boundary, &a.boundary);
        a.set_boundary(broken_a);
        b.set_boundary(broken_b);
    }
}

/// Merges the broken envelopes, keeping only the outer boundary.
fn union_envelopes(pieces: &[EdgeEnvelope], width: f64) -> Envelope {
    let mut kept: Vec<LineSegment2d> = vec![];
    let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();

    for (i, piece) in pieces.iter().enumerate() {
        for seg in &piece.boundary {
            if seg.is_degenerate(ALMOST_EPS) {
                continue;
            }

            let mid = seg.midpoint();
            let inside = pieces
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.contains(mid, true));
            if inside {
                continue;
            }

            let (bx, by) = bucket(mid, DEDUP_CELL);
            let duplicate = iproduct!(-1..=1, -1..=1).any(|(dx, dy)| {
                buckets
                    .get(&(bx + dx, by + dy))
                    .map_or(false, |ids| ids.iter().any(|id| kept[*id].almost_eq(seg, ALMOST_EPS)))
            });
            if duplicate {
                continue;
            }

            buckets.entry((bx, by)).or_default().push(kept.len());
            kept.push(*seg);
        }
    }

    let skeleton = pieces.iter().map(|piece| piece.skeleton).collect();
    Envelope::new(kept, skeleton, width)
}

fn edge_envelopes(graph: &SpatialGraph, params: &EnvelopeParams) -> Vec<EdgeEnvelope> {
    assert!(!graph.edges().is_empty(), "An envelope needs at least one edge");
    graph
        .segments()
        .map(|seg| EdgeEnvelope::new(seg, params.width, params.slices))
        .collect()
}

/// Generates the envelope around every edge of a road network,
/// along with the anchor points lying outside of the roads.
pub fn build_envelope(
    graph: &SpatialGraph,
    params: &EnvelopeParams,
    progress: Option<&Progress>,
) -> (Envelope, Vec<Point2d>) {
    info!("Generating envelope around {} edges", graph.edges().len());
    let advance = || {
        if let Some(progress) = progress {
            progress.advance();
        }
    };

    let mut pieces = edge_envelopes(graph, params);
    advance();
    let anchors = generate_anchors(&pieces, params.bounds, params.anchor_step);
    debug!("Kept {} anchors", anchors.len());
    advance();
    break_envelopes(&mut pieces);
    advance();
    let envelope = union_envelopes(&pieces, params.width);
    debug!("Kept {} boundary segments", envelope.segments().len());
    advance();

    (envelope, anchors)
}

/// Generates the envelope around a path, without anchors.
pub fn build_corridor(
    path: &SpatialGraph,
    params: &EnvelopeParams,
    progress: Option<&Progress>,
) -> Envelope {
    debug!("Generating corridor along {} edges", path.edges().len());
    let advance = || {
        if let Some(progress) = progress {
            progress.advance();
        }
    };

    let mut pieces = edge_envelopes(path, params);
    advance();
    break_envelopes(&mut pieces);
    advance();
    let envelope = union_envelopes(&pieces, params.width);
    advance();

    envelope
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::{almost_equal, distance_point_segment, intersect};

    fn graph(points: &[(f64, f64)], edges: &[(usize, usize)]) -> SpatialGraph {
        let mut graph = SpatialGraph::new();
        let ids = points
            .iter()
            .map(|(x, y)| graph.add_vertex(Point2d::new(*x, *y)))
            .collect::<Vec<_>>();
        for (a, b) in edges {
            graph.add_edge(ids[*a], ids[*b]);
        }
        graph
    }

    /// Checks that the boundary stays clear of the centre lines and never crosses itself.
    fn assert_well_formed(envelope: &Envelope) {
        let half_width = 0.5 * envelope.width();
        for seg in envelope.segments() {
            let clearance = envelope
                .skeleton()
                .iter()
                .map(|skel| distance_point_segment(seg.midpoint(), skel, true))
                .fold(f64::INFINITY, f64::min);
            assert!(clearance > half_width - 0.1, "{:?} is inside the road", seg);
        }

        for (a, b) in envelope.segments().iter().tuple_combinations() {
            if let Some(p) = intersect(a, b, true) {
                let near_end = [a.start, a.end, b.start, b.end]
                    .iter()
                    .any(|end| almost_equal(*end, p, 1e-3));
                assert!(near_end, "{:?} crosses {:?}", a, b);
            }
        }
    }

    #[test]
    fn single_edge_envelope() {
        let skeleton = LineSegment2d::from_ends(Point2d::new(0.0, 0.0), Point2d::new(100.0, 0.0));
        let envelope = edge_envelope(skeleton, 10.0, 10);

        // Two sides plus nine interior points on each cap
        assert_eq!(envelope.segments().len(), 22);
        for point in envelope.points() {
            let d = distance_point_segment(point, &skeleton, true);
            assert!((d - 5.0).abs() < 1e-6);
        }

        let polygon = envelope.points().collect::<Vec<_>>();
        assert!(point_in_polygon(Point2d::new(50.0, 0.0), &polygon, true));
        assert!(point_in_polygon(Point2d::new(-4.0, 0.0), &polygon, true));
        assert!(!point_in_polygon(Point2d::new(50.0, 6.0), &polygon, false));
        assert!(!point_in_polygon(Point2d::new(106.0, 0.0), &polygon, false));
    }

    #[test]
    fn anchors_avoid_roads() {
        let roads = graph(&[(-50.0, 0.0), (50.0, 0.0)], &[(0, 1)]);
        let params = EnvelopeParams {
            bounds: Interval::new(-100.0, 100.0),
            ..Default::default()
        };
        let progress = Progress::new(ENVELOPE_STAGES);
        let (envelope, anchors) = build_envelope(&roads, &params, Some(&progress));

        // An 11x11 grid, minus the five points along the road
        assert_eq!(anchors.len(), 116);
        assert!(!anchors.contains(&Point2d::new(0.0, 0.0)));
        assert!(!anchors.contains(&Point2d::new(40.0, 0.0)));
        assert!(anchors.contains(&Point2d::new(60.0, 0.0)));
        assert!(anchors.contains(&Point2d::new(0.0, 20.0)));

        assert_eq!(envelope.segments().len(), 22);
        assert_eq!(progress.completed(), ENVELOPE_STAGES);
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn separate_roads_are_untouched() {
        let roads = graph(
            &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0)],
            &[(0, 1), (2, 3)],
        );
        let (envelope, _) = build_envelope(&roads, &Default::default(), None);
        assert_eq!(envelope.segments().len(), 44);
        assert_eq!(envelope.skeleton().len(), 2);
        assert_well_formed(&envelope);
    }

    #[test]
    fn crossing_roads_are_merged() {
        let roads = graph(
            &[(-50.0, 0.0), (50.0, 0.0), (0.0, -50.0), (0.0, 50.0)],
            &[(0, 1), (2, 3)],
        );
        let (envelope, _) = build_envelope(&roads, &Default::default(), None);

        // Each of the four sides is split in three and loses its middle piece
        assert_eq!(envelope.segments().len(), 48);
        assert_well_formed(&envelope);
        for seg in envelope.segments() {
            assert!(!almost_equal(seg.midpoint(), Point2d::new(0.0, 5.0), 1e-6));
            assert!(!almost_equal(seg.midpoint(), Point2d::new(-5.0, 0.0), 1e-6));
        }
    }

    #[test]
    fn corridor_around_a_corner() {
        let path = graph(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)], &[(0, 1), (1, 2)]);
        let progress = Progress::new(CORRIDOR_STAGES);
        let corridor = build_corridor(&path, &Default::default(), Some(&progress));

        assert_eq!(progress.completed(), CORRIDOR_STAGES);
        assert_eq!(corridor.skeleton().len(), 2);
        assert!(corridor.segments().len() < 44);
        assert_well_formed(&corridor);

        // The shared cap at the corner is only kept once
        let outer = corridor
            .segments()
            .iter()
            .filter(|seg| seg.midpoint().y < 0.0 && seg.midpoint().x > 100.0)
            .count();
        assert_eq!(outer, 5);
    }

    #[test]
    fn random_network_envelope_is_well_formed() {
        use crate::graph::GraphParams;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let params = GraphParams::default();
        for seed in 0..4 {
            let mut rng = StdRng::seed_from_u64(seed);
            let roads = SpatialGraph::generate_random(&mut rng, &params).unwrap();
            assert_eq!(roads.edges().len(), params.edge_count);

            let (envelope, _) = build_envelope(&roads, &Default::default(), None);
            assert!(envelope.segments().len() > 4 * params.edge_count);
            assert!(envelope
                .segments()
                .iter()
                .all(|seg| !seg.is_degenerate(ALMOST_EPS)));
            assert_well_formed(&envelope);
        }
    }

    #[test]
    fn progress_without_stages_is_complete() {
        assert_eq!(Progress::new(0).fraction(), 1.0);
        let progress = Progress::new(4);
        progress.advance();
        assert_eq!(progress.fraction(), 0.25);
    }
}
