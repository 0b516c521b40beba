use super::{SpatialEdge, SpatialGraph};
use crate::error::GraphError;
use crate::math::{distance, intersect, LineSegment2d, Point2d};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The parameters of a randomly generated [SpatialGraph].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphParams {
    /// The number of vertices.
    pub vertex_count: usize,
    /// The minimum distance between any two vertices in m.
    pub min_separation: f64,
    /// The number of edges.
    pub edge_count: usize,
    /// Edges join a vertex to one of its `k_nearest` nearest neighbours.
    pub k_nearest: usize,
    /// Vertices are placed within `[-half_width, half_width)` on both axes, in m.
    pub half_width: f64,
    /// The number of rejected samples after which generation gives up.
    pub max_attempts: usize,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            vertex_count: 20,
            min_separation: 100.0,
            edge_count: 25,
            k_nearest: 3,
            half_width: 500.0,
            max_attempts: 1_000_000,
        }
    }
}

impl GraphParams {
    /// Checks that a graph with these parameters can exist at all.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.vertex_count < 2 {
            return Err(GraphError::InvalidParams("at least two vertices are required"));
        }
        if self.edge_count == 0 {
            return Err(GraphError::InvalidParams("at least one edge is required"));
        }
        if self.k_nearest == 0 {
            return Err(GraphError::InvalidParams("k_nearest must be non-zero"));
        }
        if !(self.half_width > 0.0) {
            return Err(GraphError::InvalidParams("half_width must be positive"));
        }
        if !(self.min_separation >= 0.0) || self.min_separation >= 2.0 * self.half_width {
            return Err(GraphError::InvalidParams(
                "min_separation must be non-negative and smaller than the world",
            ));
        }
        // A planar graph has at most 3V - 6 edges, and each vertex
        // only proposes edges to its k nearest neighbours.
        let n = self.vertex_count;
        let planar = if n < 3 { 1 } else { 3 * n - 6 };
        if self.edge_count > planar || self.edge_count > n * self.k_nearest.min(n - 1) {
            return Err(GraphError::InvalidParams(
                "too many edges for a planar nearest-neighbour graph",
            ));
        }
        Ok(())
    }
}

impl SpatialGraph {
    /// Generates a random graph with no two edges crossing each other.
    pub fn generate_random(rng: &mut impl Rng, params: &GraphParams) -> Result<Self, GraphError> {
        params.validate()?;

        let mut graph = SpatialGraph::new();
        for point in generate_vertices(rng, params)? {
            graph.add_vertex(point);
        }
        graph.edges = generate_edges(rng, &graph, params)?;

        debug!(
            "Generated spatial graph with {} vertices and {} edges",
            graph.vertex_count(),
            graph.edges.len()
        );
        Ok(graph)
    }
}

/// Samples points until `vertex_count` of them are more than `min_separation` apart.
fn generate_vertices(rng: &mut impl Rng, params: &GraphParams) -> Result<Vec<Point2d>, GraphError> {
    let hw = params.half_width;
    let mut points: Vec<Point2d> = Vec::with_capacity(params.vertex_count);
    let mut attempts = 0;

    while points.len() < params.vertex_count {
        attempts += 1;
        if attempts > params.max_attempts {
            return Err(GraphError::Exhausted {
                what: "vertices",
                attempts: params.max_attempts,
            });
        }
        let point = Point2d::new(rng.gen_range(-hw..hw), rng.gen_range(-hw..hw));
        if points
            .iter()
            .all(|other| distance(point, *other) > params.min_separation)
        {
            points.push(point);
        }
    }

    Ok(points)
}

/// Proposes random nearest-neighbour edges until `edge_count` of them have been accepted.
fn generate_edges(
    rng: &mut impl Rng,
    graph: &SpatialGraph,
    params: &GraphParams,
) -> Result<Vec<SpatialEdge>, GraphError> {
    let mut edges: Vec<SpatialEdge> = Vec::with_capacity(params.edge_count);
    let mut segments: Vec<LineSegment2d> = Vec::with_capacity(params.edge_count);
    let mut attempts = 0;

    while edges.len() < params.edge_count {
        attempts += 1;
        if attempts > params.max_attempts {
            return Err(GraphError::Exhausted {
                what: "edges",
                attempts: params.max_attempts,
            });
        }

        let edge = propose_edge(rng, graph, params.k_nearest);
        let segment = graph.segment(&edge);
        let is_valid = |other: &LineSegment2d| {
            *other != segment && intersect(other, &segment, true).is_none()
        };
        if segments.iter().all(is_valid) {
            edges.push(edge);
            segments.push(segment);
        }
    }

    Ok(edges)
}

/// Picks a random vertex and joins it to one of its `k` nearest neighbours.
fn propose_edge(rng: &mut impl Rng, graph: &SpatialGraph, k: usize) -> SpatialEdge {
    let ids = graph.vertex_ids();
    let start = ids[rng.gen_range(0..ids.len())];
    let origin = graph.point(start);

    let mut others = ids
        .iter()
        .copied()
        .filter(|id| *id != start)
        .collect::<Vec<_>>();
    others.sort_by(|a, b| {
        distance(origin, graph.point(*a)).total_cmp(&distance(origin, graph.point(*b)))
    });
    others.truncate(k);

    let end = *others
        .choose(rng)
        .expect("Graph has at least two vertices");
    SpatialEdge { start, end }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn random_graph_has_requested_size() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        let params = GraphParams::default();
        let graph = SpatialGraph::generate_random(&mut rng, &params).unwrap();

        assert_eq!(graph.vertex_count(), 20);
        assert_eq!(graph.edges().len(), 25);

        let points = graph.vertices().map(|(_, v)| v.point).collect::<Vec<_>>();
        for (i, a) in points.iter().enumerate() {
            assert!(a.x >= -500.0 && a.x < 500.0 && a.y >= -500.0 && a.y < 500.0);
            for b in &points[i + 1..] {
                assert!(distance(*a, *b) > 100.0);
            }
        }
    }

    #[test]
    fn random_graph_has_no_crossing_edges() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let graph = SpatialGraph::generate_random(&mut rng, &GraphParams::default()).unwrap();
        let segments = graph.segments().collect::<Vec<_>>();
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                assert_ne!(a, b);
                assert!(intersect(a, b, true).is_none());
            }
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let params = GraphParams {
            vertex_count: 1,
            ..Default::default()
        };
        assert!(matches!(
            SpatialGraph::generate_random(&mut rng, &params),
            Err(GraphError::InvalidParams(_))
        ));

        let params = GraphParams {
            vertex_count: 4,
            edge_count: 7,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn crowded_world_gives_up() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let params = GraphParams {
            vertex_count: 50,
            min_separation: 150.0,
            half_width: 200.0,
            max_attempts: 10_000,
            ..Default::default()
        };
        assert_eq!(
            SpatialGraph::generate_random(&mut rng, &params).unwrap_err(),
            GraphError::Exhausted {
                what: "vertices",
                attempts: 10_000
            }
        );
    }
}
