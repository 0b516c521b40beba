//! Nearest-segment queries against a shared envelope.

use crate::envelope::{Envelope, Location};
use crate::math::{distance_point_segment, LineSegment2d, Point2d};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// The number of queries remembered by a [CorridorIndex].
const CACHE_CAPACITY: usize = 256;

type CacheKey = (u64, u64, u64);

/// Answers "which boundary segments are near this point" for a single envelope.
///
/// Results are memoized, so each querying component should own its own index.
#[derive(Clone, Debug)]
pub struct CorridorIndex {
    /// The envelope being queried.
    envelope: Arc<Envelope>,
    /// The smallest query radius in m.
    min_radius: f64,
    /// Memoized query results.
    cache: HashMap<CacheKey, Arc<[LineSegment2d]>>,
    /// The cached keys, oldest first.
    order: VecDeque<CacheKey>,
}

impl CorridorIndex {
    /// Creates an index over the given envelope.
    ///
    /// # Parameters
    /// * `envelope` - The envelope to query
    /// * `min_radius` - Queries with a smaller radius are widened to this radius
    pub fn new(envelope: Arc<Envelope>, min_radius: f64) -> Self {
        Self {
            envelope,
            min_radius,
            cache: HashMap::with_capacity(CACHE_CAPACITY),
            order: VecDeque::with_capacity(CACHE_CAPACITY),
        }
    }

    /// The envelope being queried.
    pub fn envelope(&self) -> &Arc<Envelope> {
        &self.envelope
    }

    /// Replaces the envelope, discarding every memoized result.
    pub fn set_envelope(&mut self, envelope: Arc<Envelope>) {
        self.envelope = envelope;
        self.cache.clear();
        self.order.clear();
    }

    /// Finds the location on the envelope's skeleton nearest to a point.
    pub fn nearest_location(&self, point: Point2d) -> Location {
        self.envelope.nearest_location(point)
    }

    /// Finds the boundary segments closer than `radius` to a point, nearest first.
    pub fn nearest_segments(&mut self, point: Point2d, radius: f64) -> Arc<[LineSegment2d]> {
        let radius = f64::max(radius, self.min_radius);
        let key = (point.x.to_bits(), point.y.to_bits(), radius.to_bits());
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let mut found = self
            .envelope
            .segments()
            .iter()
            .map(|seg| (distance_point_segment(point, seg, true), *seg))
            .filter(|(dist, _)| *dist < radius)
            .collect::<Vec<_>>();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        let found: Arc<[LineSegment2d]> = found.into_iter().map(|(_, seg)| seg).collect();

        if self.order.len() == CACHE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
        self.order.push_back(key);
        self.cache.insert(key, found.clone());
        found
    }

    /// The number of memoized queries.
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}
