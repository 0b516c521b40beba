//! Spatial graphs of road junctions and the roads between them.

use crate::math::{distance, LineSegment2d, Point2d};
use crate::VertexId;
pub use generate::GraphParams;
use pathfinding::directed::dijkstra::{dijkstra, dijkstra_all};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

mod generate;

/// A vertex of a [SpatialGraph], typically a road junction.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialVertex {
    /// The location of the vertex in world space.
    pub point: Point2d,
}

/// An undirected edge between two vertices of a [SpatialGraph].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialEdge {
    pub start: VertexId,
    pub end: VertexId,
}

impl SpatialEdge {
    /// Given one end of the edge, returns the other one.
    pub fn other(&self, vertex: VertexId) -> Option<VertexId> {
        if self.start == vertex {
            Some(self.end)
        } else if self.end == vertex {
            Some(self.start)
        } else {
            None
        }
    }
}

/// A graph whose vertices are points in the plane and whose edges are straight roads.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialGraph {
    /// The vertices of the graph.
    vertices: SlotMap<VertexId, SpatialVertex>,
    /// The vertex IDs, in insertion order (path order for a path graph).
    order: Vec<VertexId>,
    /// The edges of the graph.
    edges: Vec<SpatialEdge>,
}

/// Converts an edge length in m to an integral path cost.
fn edge_cost(length: f64) -> u64 {
    (1000.0 * length).round() as u64
}

impl SpatialGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a vertex to the graph.
    pub fn add_vertex(&mut self, point: Point2d) -> VertexId {
        let id = self.vertices.insert(SpatialVertex { point });
        self.order.push(id);
        id
    }

    /// Adds an edge between two existing vertices.
    pub fn add_edge(&mut self, start: VertexId, end: VertexId) {
        assert!(
            self.vertices.contains_key(start) && self.vertices.contains_key(end),
            "Edge endpoints must be vertices of the graph"
        );
        self.edges.push(SpatialEdge { start, end });
    }

    /// The number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.order.len()
    }

    /// Gets a vertex by its ID.
    pub fn vertex(&self, id: VertexId) -> &SpatialVertex {
        &self.vertices[id]
    }

    /// Gets the location of a vertex.
    pub fn point(&self, id: VertexId) -> Point2d {
        self.vertices[id].point
    }

    /// The vertex IDs in insertion order.
    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.order
    }

    /// Returns an iterator over the vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &SpatialVertex)> + '_ {
        self.order.iter().map(|id| (*id, &self.vertices[*id]))
    }

    /// The edges of the graph.
    pub fn edges(&self) -> &[SpatialEdge] {
        &self.edges
    }

    /// The line segment covered by an edge.
    pub fn segment(&self, edge: &SpatialEdge) -> LineSegment2d {
        LineSegment2d::from_ends(self.point(edge.start), self.point(edge.end))
    }

    /// Returns an iterator over the line segments of every edge.
    pub fn segments(&self) -> impl Iterator<Item = LineSegment2d> + '_ {
        self.edges.iter().map(|edge| self.segment(edge))
    }

    /// The segment of the first edge, if there is one.
    pub fn first_segment(&self) -> Option<LineSegment2d> {
        self.edges.first().map(|edge| self.segment(edge))
    }

    /// The segment of the last edge, if there is one.
    pub fn last_segment(&self) -> Option<LineSegment2d> {
        self.edges.last().map(|edge| self.segment(edge))
    }

    /// Returns the vertices connected to `vertex`, along with the length of the edge.
    pub fn neighbours(&self, vertex: VertexId) -> impl Iterator<Item = (VertexId, f64)> + '_ {
        self.edges.iter().filter_map(move |edge| {
            let other = edge.other(vertex)?;
            Some((other, distance(self.point(vertex), self.point(other))))
        })
    }

    /// Finds the vertex closest to a point.
    pub fn nearest_vertex(&self, point: Point2d) -> Option<VertexId> {
        self.order.iter().copied().min_by(|a, b| {
            let da = distance(point, self.point(*a));
            let db = distance(point, self.point(*b));
            da.total_cmp(&db)
        })
    }

    /// Finds the vertex reachable from `start` which is farthest from it as the crow flies.
    /// Returns `None` if no other vertex is reachable.
    pub fn farthest_reachable(&self, start: VertexId) -> Option<VertexId> {
        let origin = self.point(start);
        dijkstra_all(&start, |id| self.successors(*id))
            .into_keys()
            .filter(|id| *id != start)
            .max_by(|a, b| {
                let da = distance(origin, self.point(*a));
                let db = distance(origin, self.point(*b));
                da.total_cmp(&db)
            })
    }

    /// Computes the shortest path between two vertices, weighted by edge length.
    ///
    /// Returns a new graph containing only the vertices and edges of the path,
    /// in path order, or `None` if `stop` can't be reached from `start`.
    pub fn shortest_path(&self, start: VertexId, stop: VertexId) -> Option<SpatialGraph> {
        let (route, _) = dijkstra(&start, |id| self.successors(*id), |id| *id == stop)?;

        let mut path = SpatialGraph::new();
        let mut prev = None;
        for id in route {
            let vertex = path.add_vertex(self.point(id));
            if let Some(prev) = prev {
                path.add_edge(prev, vertex);
            }
            prev = Some(vertex);
        }
        Some(path)
    }

    /// Adds a vertex before the first vertex, joined to it by a new first edge.
    pub fn prepend_vertex(&mut self, point: Point2d) -> VertexId {
        let first = *self.order.first().expect("Cannot prepend to an empty graph");
        let id = self.vertices.insert(SpatialVertex { point });
        self.order.insert(0, id);
        self.edges.insert(0, SpatialEdge { start: id, end: first });
        id
    }

    /// Adds a vertex after the last vertex, joined to it by a new last edge.
    pub fn append_vertex(&mut self, point: Point2d) -> VertexId {
        let last = *self.order.last().expect("Cannot append to an empty graph");
        let id = self.add_vertex(point);
        self.edges.push(SpatialEdge { start: last, end: id });
        id
    }

    fn successors(&self, vertex: VertexId) -> impl Iterator<Item = (VertexId, u64)> + '_ {
        self.neighbours(vertex).map(|(id, length)| (id, edge_cost(length)))
    }
}
