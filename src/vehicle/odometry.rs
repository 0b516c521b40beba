use crate::envelope::Location;
use crate::math::{distance, EPS};
use arrayvec::ArrayVec;

/// The number of skeleton segments remembered by an [Odometer].
pub const MAX_VISITED_LOCATIONS: usize = 10;

/// Tracks where a vehicle is along its corridor and how far it has travelled.
#[derive(Clone, Debug)]
pub(crate) struct Odometer {
    /// The vehicle's location on the skeleton as of the last update.
    current: Location,
    /// The entry point of each recently visited skeleton segment, oldest first.
    /// Never empty.
    visited: ArrayVec<Location, MAX_VISITED_LOCATIONS>,
    /// The length of every segment left behind, in m.
    total_distance: f64,
    /// The sum of the speed sampled at every tick, in m/s.
    total_speed: f64,
    /// The number of ticks sampled.
    ticks: usize,
}

impl Odometer {
    /// Creates an odometer which starts at the given location.
    pub fn new(start: Location) -> Self {
        let mut visited = ArrayVec::new();
        visited.push(start);
        Self {
            current: start,
            visited,
            total_distance: 0.0,
            total_speed: 0.0,
            ticks: 0,
        }
    }

    pub fn current(&self) -> Location {
        self.current
    }

    pub fn visited(&self) -> &[Location] {
        &self.visited
    }

    /// The most recently visited location.
    pub fn last_visited(&self) -> Location {
        self.visited[self.visited.len() - 1]
    }

    /// The entry point of the segment before the current one, if there is one.
    pub fn spawn_location(&self) -> Location {
        match self.visited.len() {
            1 => self.visited[0],
            n => self.visited[n - 2],
        }
    }

    /// Updates the current location. When it lies on a new skeleton segment, the segment's
    /// closest end is recorded as visited and the previous segment is added to the distance.
    /// Returns `true` iff a new segment was entered.
    pub fn localize(&mut self, location: Location) -> bool {
        self.current = location;
        if self.last_visited().segment == location.segment {
            return false;
        }

        if self.visited.is_full() {
            self.visited.remove(0);
        }
        self.visited.push(Location {
            segment: location.segment,
            point: location.segment.closest_end(location.point),
        });
        self.total_distance += self.visited[self.visited.len() - 2].segment.length();
        true
    }

    /// Samples the vehicle's speed for the average speed statistic.
    pub fn record_speed(&mut self, speed: f64) {
        self.total_speed += speed;
        self.ticks += 1;
    }

    /// The distance travelled along the skeleton, in m.
    pub fn total_distance(&self) -> f64 {
        self.total_distance + distance(self.last_visited().point, self.current.point)
    }

    /// The average of the sampled speeds, in m/s.
    pub fn average_speed(&self) -> f64 {
        self.total_speed / (self.ticks as f64 + EPS)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::{LineSegment2d, Point2d};
    use assert_approx_eq::assert_approx_eq;

    fn location(i: usize, t: f64) -> Location {
        let x = 10.0 * i as f64;
        let segment = LineSegment2d::from_ends(Point2d::new(x, 0.0), Point2d::new(x + 10.0, 0.0));
        Location {
            segment,
            point: segment.lerp(t),
        }
    }

    #[test]
    fn accumulates_left_segments() {
        let mut odo = Odometer::new(location(0, 0.0));
        assert!(!odo.localize(location(0, 0.5)));
        assert_approx_eq!(odo.total_distance(), 5.0);
        assert_eq!(odo.spawn_location(), location(0, 0.0));

        assert!(odo.localize(location(1, 0.2)));
        assert_eq!(odo.visited().len(), 2);
        assert_eq!(odo.last_visited(), location(1, 0.0));
        assert_approx_eq!(odo.total_distance(), 12.0);
        assert_eq!(odo.spawn_location(), location(0, 0.0));
    }

    #[test]
    fn history_is_bounded() {
        let mut odo = Odometer::new(location(0, 0.0));
        for i in 1..25 {
            odo.localize(location(i, 0.1));
            assert!(odo.visited().len() <= MAX_VISITED_LOCATIONS);
        }
        assert_eq!(odo.visited().len(), MAX_VISITED_LOCATIONS);
        assert_eq!(odo.visited()[0].segment, location(15, 0.0).segment);
        assert_eq!(odo.spawn_location(), location(23, 0.0));
        assert_approx_eq!(odo.total_distance(), 241.0);
    }

    #[test]
    fn average_speed() {
        let mut odo = Odometer::new(location(0, 0.0));
        assert_approx_eq!(odo.average_speed(), 0.0);
        odo.record_speed(10.0);
        odo.record_speed(20.0);
        assert_approx_eq!(odo.average_speed(), 15.0, 1e-5);
    }
}
