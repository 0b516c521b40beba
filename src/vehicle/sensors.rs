use crate::math::{cast_ray_segments, from_angle, LineSegment2d, Point2d, Vector2d};
use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fan of distance sensors centred on the vehicle's heading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RayFan {
    /// The maximum ray length in m.
    pub length: f64,
    /// Half the angle covered by the fan, in radians.
    pub fov: f64,
    /// The number of rays.
    pub count: usize,
}

impl RayFan {
    /// Casts every ray of the fan against the candidate segments.
    ///
    /// The rays sweep from `heading - fov` up to, but excluding, `heading + fov`.
    /// Each ray ends at the closest segment it hits, or at its full length.
    pub fn cast(
        &self,
        origin: Point2d,
        heading: Vector2d,
        candidates: &[LineSegment2d],
    ) -> Vec<LineSegment2d> {
        let alpha = heading.y.atan2(heading.x);
        let sweep = Interval::new(alpha - self.fov, alpha + self.fov);
        (0..self.count)
            .map(|i| {
                let beta = sweep.lerp(i as f64 / self.count as f64);
                cast_ray_segments(origin, from_angle(beta), self.length, candidates, false)
            })
            .collect()
    }
}

/// The normalized sensor readings of a vehicle, as fed to a driving agent.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// One value per ray: 0 when nothing is in range, approaching 1 as an obstacle gets closer.
    pub rays: Vec<f64>,
    /// The speed as a fraction of the vehicle's top speed.
    pub speed: f64,
}

impl Observation {
    pub(crate) fn new(
        rays: &[LineSegment2d],
        ray_length: f64,
        speed_kmh: f64,
        top_speed_kmh: f64,
    ) -> Self {
        Self {
            rays: rays.iter().map(|ray| 1.0 - ray.length() / ray_length).collect(),
            speed: speed_kmh / top_speed_kmh,
        }
    }

    /// The readings as a flat input vector: the rays followed by the speed.
    pub fn inputs(&self) -> impl Iterator<Item = f64> + '_ {
        self.rays.iter().copied().chain(std::iter::once(self.speed))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> LineSegment2d {
        LineSegment2d::from_ends(Point2d::new(x1, y1), Point2d::new(x2, y2))
    }

    #[test]
    fn fan_sweeps_around_heading() {
        let fan = RayFan {
            length: 10.0,
            fov: FRAC_PI_2,
            count: 4,
        };
        let rays = fan.cast(Point2d::new(0.0, 0.0), Vector2d::new(1.0, 0.0), &[]);
        assert_eq!(rays.len(), 4);

        // -90, -45, 0 and 45 degrees
        assert_approx_eq!(rays[0].end.y, -10.0);
        assert_approx_eq!(rays[2].end.x, 10.0);
        assert_approx_eq!(rays[3].end.x, rays[3].end.y);
        for ray in &rays {
            assert_approx_eq!(ray.length(), 10.0);
        }
    }

    #[test]
    fn rays_stop_at_closest_wall() {
        let fan = RayFan {
            length: 25.0,
            fov: 0.1,
            count: 1,
        };
        let walls = [seg(8.0, -5.0, 8.0, 5.0), seg(4.0, -5.0, 4.0, 5.0)];
        let rays = fan.cast(Point2d::new(0.0, 0.0), Vector2d::new(1.0, 0.0), &walls);
        assert_approx_eq!(rays[0].end.x, 4.0);
    }

    #[test]
    fn observation_is_normalized() {
        let rays = [seg(0.0, 0.0, 25.0, 0.0), seg(0.0, 0.0, 5.0, 0.0)];
        let obs = Observation::new(&rays, 25.0, 62.5, 125.0);
        assert_approx_eq!(obs.rays[0], 0.0);
        assert_approx_eq!(obs.rays[1], 0.8);
        assert_approx_eq!(obs.speed, 0.5);
        assert_eq!(obs.inputs().count(), 3);
    }
}
