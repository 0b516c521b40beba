use self::dynamics::Body;
use self::odometry::Odometer;
use self::sensors::RayFan;
use crate::debug::{debug_circle, debug_line};
use crate::envelope::{Envelope, Location};
use crate::index::CorridorIndex;
use crate::math::{
    collision_circle_segment, nearest_point_segment, rot90, try_normalize, LineSegment2d, Point2d,
    Vector2d,
};
use crate::util::Interval;
use cgmath::prelude::*;
use log::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

pub use odometry::MAX_VISITED_LOCATIONS;
pub use sensors::Observation;

mod dynamics;
mod odometry;
mod sensors;

/// Set while the vehicle is touching the edge of the road.
pub const FLAG_DAMAGED: u8 = 1 << 0;

/// Set while the vehicle is within the off-track distance of the centre line.
pub const FLAG_OFF_TRACK: u8 = 1 << 1;

/// The attributes of a simulated vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleAttributes {
    /// The vehicle mass in kg.
    pub mass: f64,
    /// The vehicle length in m.
    pub length: f64,
    /// The vehicle width in m.
    pub width: f64,
    /// The largest wheel angle in radians.
    pub max_wheel_angle: f64,
    /// The traction force at full throttle, in N.
    pub max_engine_power: f64,
    /// The drag coefficient between the tyres and the road.
    pub drag_road: f64,
    /// The rolling resistance coefficient.
    pub drag_rolling: f64,
    /// The maximum length of a sensor ray in m.
    pub ray_length: f64,
    /// Half the angle covered by the sensor rays, in radians.
    pub ray_fov: f64,
    /// The number of sensor rays.
    pub ray_count: usize,
    /// The lateral offset of the spawn point from the centre line, in m.
    pub lane_offset: f64,
    /// The vehicle is flagged off-track when closer than this to the centre line, in m.
    pub off_track_distance: f64,
    /// The life of an undamaged vehicle.
    pub max_life: f64,
    /// The speed used to normalize observations, in km/h.
    pub top_speed_kmh: f64,
}

impl Default for VehicleAttributes {
    fn default() -> Self {
        Self {
            mass: 650.0,
            length: 5.0,
            width: 2.0,
            max_wheel_angle: PI / 6.0,
            max_engine_power: 200_000.0,
            drag_road: 0.9,
            drag_rolling: 0.01,
            ray_length: 25.0,
            ray_fov: 0.3 * PI,
            ray_count: 16,
            lane_offset: 2.5,
            off_track_distance: 1.5,
            max_life: 100.0,
            top_speed_kmh: 125.0,
        }
    }
}

/// A simulated vehicle driving within a road envelope.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's attributes.
    attrs: VehicleAttributes,
    /// The corridor the vehicle drives in.
    index: CorridorIndex,
    /// The vehicle's rigid body.
    body: Body,
    /// The wheel angle in radians.
    wheel: f64,
    /// The traction force in N.
    throttle: f64,
    /// The remaining life, between 0 and `max_life`.
    life: f64,
    /// A combination of [FLAG_DAMAGED] and [FLAG_OFF_TRACK].
    flags: u8,
    /// The sensor rays cast during the last update.
    rays: Vec<LineSegment2d>,
    /// The segment from the vehicle to the nearest point of the last visited centre line.
    proximity: Option<LineSegment2d>,
    /// The location reset to.
    spawn: Location,
    /// Localization and travel statistics.
    odometer: Odometer,
    /// The position before the last update.
    prev_pos: Point2d,
    /// The position after the last update.
    curr_pos: Point2d,
}

impl Vehicle {
    /// Creates a vehicle at the start of the envelope's first centre line.
    ///
    /// # Parameters
    /// * `attrs` - The vehicle's attributes
    /// * `envelope` - The corridor to drive in
    /// * `min_radius` - The smallest radius of the nearest segment queries, in m
    pub fn new(attrs: VehicleAttributes, envelope: Arc<Envelope>, min_radius: f64) -> Self {
        let segment = envelope.skeleton()[0];
        let spawn = Location {
            segment,
            point: segment.start,
        };
        let mut vehicle = Self {
            attrs,
            index: CorridorIndex::new(envelope, min_radius),
            body: Body::new(spawn.point, Vector2d::unit_x(), attrs.mass),
            wheel: 0.0,
            throttle: 0.0,
            life: attrs.max_life,
            flags: 0,
            rays: vec![],
            proximity: None,
            spawn,
            odometer: Odometer::new(spawn),
            prev_pos: spawn.point,
            curr_pos: spawn.point,
        };
        vehicle.reset(None);
        vehicle
    }

    /// The vehicle's attributes.
    pub fn attributes(&self) -> &VehicleAttributes {
        &self.attrs
    }

    /// The corridor the vehicle drives in.
    pub fn envelope(&self) -> &Arc<Envelope> {
        self.index.envelope()
    }

    /// The coordinates in world space of the centre of the vehicle.
    pub fn position(&self) -> Point2d {
        self.body.pos
    }

    /// The vehicle's velocity in m/s.
    pub fn velocity(&self) -> Vector2d {
        self.body.vel
    }

    /// A unit vector aligned with the vehicle's heading.
    pub fn heading(&self) -> Vector2d {
        self.body.head
    }

    /// The wheel angle in radians.
    pub fn wheel(&self) -> f64 {
        self.wheel
    }

    /// The sensor rays cast during the last update.
    pub fn rays(&self) -> &[LineSegment2d] {
        &self.rays
    }

    /// The segment from the vehicle to the nearest point of the last visited centre line.
    pub fn proximity(&self) -> Option<LineSegment2d> {
        self.proximity
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn is_damaged(&self) -> bool {
        self.flags & FLAG_DAMAGED != 0
    }

    pub fn is_off_track(&self) -> bool {
        self.flags & FLAG_OFF_TRACK != 0
    }

    /// The remaining life.
    pub fn life(&self) -> f64 {
        self.life
    }

    /// Whether the vehicle has any life left.
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// The location on the corridor's centre line nearest to the vehicle.
    pub fn current_location(&self) -> Location {
        self.odometer.current()
    }

    /// The entry points of the recently visited centre line segments, oldest first.
    pub fn visited_locations(&self) -> &[Location] {
        self.odometer.visited()
    }

    /// The position before the last update.
    pub fn prev_position(&self) -> Point2d {
        self.prev_pos
    }

    /// The position after the last update.
    pub fn curr_position(&self) -> Point2d {
        self.curr_pos
    }

    /// The distance travelled along the corridor, in km.
    pub fn total_distance_km(&self) -> f64 {
        self.odometer.total_distance() * 0.001
    }

    /// The average speed since the last reset, in km/h.
    pub fn average_speed_kmh(&self) -> f64 {
        self.odometer.average_speed() * 3.6
    }

    /// The current speed in km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.body.speed() * 3.6
    }

    /// The location the vehicle should respawn at after a crash:
    /// the entry point of the previously visited segment.
    pub fn spawn_location(&self) -> Location {
        self.odometer.spawn_location()
    }

    /// The normalized sensor readings.
    pub fn observation(&self) -> Observation {
        Observation::new(
            &self.rays,
            self.attrs.ray_length,
            self.speed_kmh(),
            self.attrs.top_speed_kmh,
        )
    }

    /// Whether the vehicle is undamaged, on track, moving forward, and faster than `min_speed_kmh`.
    pub fn is_viable(&self, min_speed_kmh: f64) -> bool {
        !self.is_damaged()
            && !self.is_off_track()
            && self.body.vel.dot(self.body.head) >= 0.0
            && self.speed_kmh() >= min_speed_kmh
    }

    /// Sets the traction force as a fraction of the engine power between -1 and 1.
    pub fn push_throttle(&mut self, power: f64) {
        self.throttle = self.attrs.max_engine_power * power.clamp(-1.0, 1.0);
    }

    /// Sets the wheel angle as a fraction of the largest angle between -1 and 1.
    /// Positive values turn anticlockwise.
    pub fn turn_wheel(&mut self, torque: f64) {
        let max = self.attrs.max_wheel_angle;
        let t = 0.5 * (torque.clamp(-1.0, 1.0) + 1.0);
        self.wheel = Interval::new(-max, max).lerp(t);
    }

    /// Reduces the vehicle's life, which never drops below zero.
    pub fn hit(&mut self, damage: f64) {
        self.life = f64::max(0.0, self.life - f64::max(damage, 0.0));
    }

    /// Moves the vehicle into a new corridor which starts where it is now.
    ///
    /// # Panics
    /// Panics if the vehicle's current segment is not the first centre line of the corridor.
    pub fn set_corridor(&mut self, envelope: Arc<Envelope>) {
        assert!(
            self.odometer.current().segment == envelope.skeleton()[0],
            "The new corridor must start on the vehicle's current segment"
        );
        self.index.set_envelope(envelope);
    }

    /// Places the vehicle back at rest near its spawn location, restoring its life
    /// and clearing its statistics. If a location is given it becomes the new spawn location.
    ///
    /// The vehicle is placed just past the segment's end closest to the spawn point,
    /// facing the other end and offset into the lane on its right.
    pub fn reset(&mut self, spawn: Option<Location>) {
        if let Some(spawn) = spawn {
            self.spawn = spawn;
        }
        let Location { segment, point } = self.spawn;
        let near = segment.closest_end(point);
        let far = segment.farthest_end(point);
        let start = near + (far - near) * 0.01;
        let dir = try_normalize(far - start).unwrap_or_else(Vector2d::unit_x);
        let pos = start + rot90(dir) * self.attrs.lane_offset;

        self.body = Body::new(pos, dir, self.attrs.mass);
        self.life = self.attrs.max_life;
        self.wheel = 0.0;
        self.throttle = 0.0;
        self.flags = 0;
        self.odometer = Odometer::new(Location {
            segment,
            point: start,
        });
        self.rays = self.cast_rays();
        self.proximity = None;
        self.prev_pos = pos;
        self.curr_pos = pos;
    }

    /// Advances the vehicle by one tick.
    ///
    /// # Parameters
    /// * `dt` - The time step in seconds
    pub fn update(&mut self, dt: f64) {
        // Dynamics
        let drag = self.attrs.drag_road + self.attrs.drag_rolling;
        self.body.steer(self.wheel, self.attrs.length, dt);
        let force = self.body.net_force(self.throttle, drag);
        self.body.integrate(force, dt);

        // Collisions
        match self.collision() {
            Some(reaction) => {
                trace!("Vehicle collided at {:?}", self.body.pos);
                debug_line("collision", self.body.pos, self.body.pos + reaction);
                self.body.bounce(reaction);
                self.flags |= FLAG_DAMAGED;
            }
            None => self.flags &= !FLAG_DAMAGED,
        }

        self.prev_pos = self.curr_pos;
        self.curr_pos = self.body.pos;
        let pos = self.body.pos;

        // Sensors
        self.rays = self.cast_rays();
        let centre = self.odometer.last_visited().segment;
        self.proximity = nearest_point_segment(pos, &centre, true)
            .map(|nearest| LineSegment2d::from_ends(pos, nearest));
        match self.proximity {
            Some(prox) if prox.length() < self.attrs.off_track_distance => {
                self.flags |= FLAG_OFF_TRACK
            }
            _ => self.flags &= !FLAG_OFF_TRACK,
        }

        // Localization
        if self.odometer.localize(self.index.nearest_location(pos)) {
            trace!(
                "Vehicle entered segment {:?}",
                self.odometer.current().segment
            );
        }

        // Statistics
        self.odometer.record_speed(self.body.speed());

        debug_circle("vehicle", pos, 0.5 * self.attrs.width);
        for ray in &self.rays {
            debug_line("ray", ray.start, ray.end);
        }
    }

    /// Finds the reaction pushing the vehicle out of the first boundary segment it overlaps.
    fn collision(&mut self) -> Option<Vector2d> {
        let radius = 0.5 * self.attrs.width;
        let pos = self.body.pos;
        self.index
            .nearest_segments(pos, radius)
            .iter()
            .find_map(|seg| collision_circle_segment(pos, radius, seg))
    }

    fn cast_rays(&mut self) -> Vec<LineSegment2d> {
        let fan = RayFan {
            length: self.attrs.ray_length,
            fov: self.attrs.ray_fov,
            count: self.attrs.ray_count,
        };
        let nearby = self.index.nearest_segments(self.body.pos, fan.length);
        fan.cast(self.body.pos, self.body.head, &nearby)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::envelope::build_corridor;
    use crate::graph::SpatialGraph;
    use assert_approx_eq::assert_approx_eq;

    const DT: f64 = 1.0 / 60.0;

    /// A straight corridor made of two 100 m centre lines along the x axis.
    fn corridor(points: &[(f64, f64)]) -> Arc<Envelope> {
        let mut path = SpatialGraph::new();
        let mut prev = None;
        for (x, y) in points {
            let id = path.add_vertex(Point2d::new(*x, *y));
            if let Some(prev) = prev {
                path.add_edge(prev, id);
            }
            prev = Some(id);
        }
        Arc::new(build_corridor(&path, &Default::default(), None))
    }

    fn vehicle() -> Vehicle {
        let envelope = corridor(&[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0)]);
        Vehicle::new(Default::default(), envelope, 50.0)
    }

    #[test]
    fn spawns_in_lane() {
        let car = vehicle();
        assert_approx_eq!(car.position().x, 1.0);
        assert_approx_eq!(car.position().y, 2.5);
        assert_approx_eq!(car.heading().x, 1.0);
        assert_eq!(car.velocity(), Vector2d::new(0.0, 0.0));
        assert_eq!(car.life(), 100.0);
        assert_eq!(car.flags(), 0);
        assert_eq!(car.rays().len(), 16);
        assert_eq!(car.visited_locations().len(), 1);
        assert_eq!(car.spawn_location().point, Point2d::new(1.0, 0.0));
    }

    #[test]
    fn speed_converges_to_terminal_velocity() {
        let mut car = vehicle();
        car.push_throttle(1.0);
        // Traction balances drag at 200 kN / (0.91 * 650 kg * 9.81 m/s^2)
        let terminal = 200_000.0 / (0.91 * 650.0 * 9.81);

        let mut speed = 0.0;
        for _ in 0..120 {
            car.update(DT);
            let next = car.velocity().magnitude();
            assert!(next >= speed);
            assert!(next < terminal);
            assert!(!car.is_damaged() && !car.is_off_track());
            speed = next;
        }
        assert_approx_eq!(speed, terminal, 1e-3);
        assert_approx_eq!(car.position().y, 2.5);
        assert!(car.is_viable(5.0));
    }

    #[test]
    fn odometer_follows_centre_line() {
        let mut car = vehicle();
        car.push_throttle(1.0);

        let mut total = 0.0;
        while car.position().x < 150.0 {
            car.update(DT);
            let next = car.total_distance_km();
            assert!(next >= total);
            total = next;

            if car.position().x < 99.0 {
                assert_approx_eq!(total, (car.position().x - 1.0) * 0.001);
            } else if car.position().x > 101.0 {
                assert_eq!(car.visited_locations().len(), 2);
                assert_approx_eq!(total, car.position().x * 0.001);
            }
        }

        let spawn = car.spawn_location();
        assert_eq!(spawn.point, Point2d::new(1.0, 0.0));
        assert!(car.average_speed_kmh() > 100.0);
    }

    #[test]
    fn crash_and_recover() {
        // A single road ending at x = 100
        let envelope = corridor(&[(0.0, 0.0), (100.0, 0.0)]);
        let mut car = Vehicle::new(Default::default(), envelope, 50.0);
        car.push_throttle(1.0);

        let mut ticks = 0;
        while !car.is_damaged() {
            car.update(DT);
            ticks += 1;
            assert!(ticks < 600, "Vehicle never reached the end of the road");
        }
        assert!(car.position().x > 100.0 && car.position().x < 105.0);
        assert!(!car.is_viable(0.0));

        car.push_throttle(-1.0);
        ticks = 0;
        while car.is_damaged() {
            car.update(DT);
            ticks += 1;
            assert!(ticks < 60, "Vehicle never cleared the wall");
        }
    }

    #[test]
    fn wheel_turns_heading() {
        let mut car = vehicle();
        car.push_throttle(1.0);
        for _ in 0..30 {
            car.update(DT);
        }
        car.turn_wheel(1.0);
        assert_approx_eq!(car.wheel(), PI / 6.0);
        car.update(DT);
        assert!(car.heading().y > 0.0);

        car.turn_wheel(-5.0);
        assert_approx_eq!(car.wheel(), -PI / 6.0);
        car.turn_wheel(0.0);
        assert_approx_eq!(car.wheel(), 0.0);
    }

    #[test]
    fn life_is_clamped() {
        let mut car = vehicle();
        car.hit(30.0);
        assert_eq!(car.life(), 70.0);
        car.hit(-10.0);
        assert_eq!(car.life(), 70.0);
        car.hit(200.0);
        assert_eq!(car.life(), 0.0);
        assert!(!car.is_alive());

        car.reset(None);
        assert_eq!(car.life(), 100.0);
    }

    #[test]
    fn reset_to_new_spawn_location() {
        let mut car = vehicle();
        let segment = car.envelope().skeleton()[1];
        car.reset(Some(Location {
            segment,
            point: Point2d::new(190.0, 0.0),
        }));

        // Closest to the far end, so facing back along the road
        assert_approx_eq!(car.heading().x, -1.0);
        assert_approx_eq!(car.position().x, 199.0);
        assert_approx_eq!(car.position().y, -2.5);
        assert_eq!(car.spawn_location().segment, segment);
    }

    #[test]
    #[should_panic]
    fn corridor_must_start_on_current_segment() {
        let mut car = vehicle();
        let other = corridor(&[(100.0, 0.0), (200.0, 0.0)]);
        car.set_corridor(other);
    }
}
