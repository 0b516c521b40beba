use crate::math::{rotate, try_normalize, Point2d, Vector2d, EPS};
use cgmath::InnerSpace;

/// The gravitational acceleration in m/s^2.
pub const GRAVITY: f64 = 9.81;

/// The rigid body of a vehicle.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Body {
    /// The position of the centre of the vehicle.
    pub pos: Point2d,
    /// The velocity in m/s.
    pub vel: Vector2d,
    /// A unit vector aligned with the vehicle's heading.
    pub head: Vector2d,
    /// The mass in kg.
    pub mass: f64,
}

impl Body {
    /// Creates a body at rest.
    pub fn new(pos: Point2d, head: Vector2d, mass: f64) -> Self {
        Self {
            pos,
            vel: Vector2d::new(0.0, 0.0),
            head,
            mass,
        }
    }

    /// The speed in m/s.
    pub fn speed(&self) -> f64 {
        self.vel.magnitude()
    }

    /// Rotates the heading as the vehicle follows the circle
    /// described by its wheel angle.
    ///
    /// # Parameters
    /// * `wheel` - The wheel angle in radians, positive is anticlockwise
    /// * `length` - The vehicle length in m
    /// * `dt` - The time step in seconds
    pub fn steer(&mut self, wheel: f64, length: f64, dt: f64) {
        if wheel.abs() < EPS {
            return;
        }
        let radius = length / wheel.sin();
        self.head = rotate(self.head, self.speed() / radius * dt);
    }

    /// The sum of the traction and drag forces, in N.
    ///
    /// # Parameters
    /// * `throttle` - The traction force along the heading, in N
    /// * `drag` - The combined road and rolling drag coefficients
    pub fn net_force(&self, throttle: f64, drag: f64) -> Vector2d {
        self.head * throttle - self.vel * drag * self.mass * GRAVITY
    }

    /// Integrates the velocity and position using semi-implicit Euler.
    pub fn integrate(&mut self, force: Vector2d, dt: f64) {
        self.vel += force / self.mass * dt;
        self.pos += self.vel * dt;
    }

    /// Pushes the body out of an obstacle it overlaps.
    ///
    /// The velocity is halved before the reaction is added, and the heading
    /// follows the new velocity unless the body has come to a stop.
    pub fn bounce(&mut self, reaction: Vector2d) {
        self.vel = self.vel * 0.5 + reaction;
        self.pos += reaction;
        if let Some(head) = try_normalize(self.vel) {
            self.head = head;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_6;

    fn body() -> Body {
        Body::new(Point2d::new(0.0, 0.0), Vector2d::new(1.0, 0.0), 650.0)
    }

    #[test]
    fn straight_wheel_keeps_heading() {
        let mut body = body();
        body.vel = Vector2d::new(10.0, 0.0);
        body.steer(0.0, 5.0, 0.1);
        assert_eq!(body.head, Vector2d::new(1.0, 0.0));
    }

    #[test]
    fn turning_rate_follows_speed_and_wheel() {
        let mut body = body();
        body.vel = Vector2d::new(10.0, 0.0);
        // A wheel angle of 30 degrees turns on a circle of radius 10 m
        body.steer(FRAC_PI_6, 5.0, 0.1);
        assert_approx_eq!(body.head.y.atan2(body.head.x), 0.1);
        assert_approx_eq!(body.head.magnitude(), 1.0);

        body.steer(-FRAC_PI_6, 5.0, 0.1);
        assert_approx_eq!(body.head.y, 0.0);

        // Stationary vehicles do not turn
        body.vel = Vector2d::new(0.0, 0.0);
        body.steer(FRAC_PI_6, 5.0, 0.1);
        assert_approx_eq!(body.head.y, 0.0);
    }

    #[test]
    fn drag_opposes_velocity() {
        let mut body = body();
        body.vel = Vector2d::new(2.0, -1.0);
        let force = body.net_force(0.0, 0.91);
        assert_approx_eq!(force.x, -2.0 * 0.91 * 650.0 * GRAVITY);
        assert_approx_eq!(force.y, 0.91 * 650.0 * GRAVITY);
    }

    #[test]
    fn semi_implicit_euler() {
        let mut body = body();
        body.integrate(Vector2d::new(650.0, 0.0), 0.5);
        assert_approx_eq!(body.vel.x, 0.5);
        // Position uses the updated velocity
        assert_approx_eq!(body.pos.x, 0.25);
    }

    #[test]
    fn bounce_halves_velocity() {
        let mut body = body();
        body.vel = Vector2d::new(10.0, 0.0);
        body.bounce(Vector2d::new(-0.5, 0.0));
        assert_approx_eq!(body.vel.x, 4.5);
        assert_approx_eq!(body.pos.x, -0.5);
        assert_eq!(body.head, Vector2d::new(1.0, 0.0));

        // The heading is kept when the bounce stops the body
        let mut body = self::body();
        body.vel = Vector2d::new(1.0, 0.0);
        body.head = Vector2d::new(0.0, 1.0);
        body.bounce(Vector2d::new(-0.5, 0.0));
        assert_eq!(body.head, Vector2d::new(0.0, 1.0));
    }
}
