//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use cgmath::num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: std::cmp::PartialOrd> Interval<T> {
    /// Returns true if this interval overlaps with the other.
    /// Intervals which merely touch are considered overlapping.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max >= other.min && other.max >= self.min
    }

    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: Float> Interval<T> {
    /// Creates an interval with the given centre and radius.
    pub fn disc(centre: T, radius: T) -> Self {
        Self {
            min: centre - radius,
            max: centre + radius,
        }
    }

    /// Grows the interval by `amount` on both sides.
    pub fn expand(&self, amount: T) -> Self {
        Self {
            min: self.min - amount,
            max: self.max + amount,
        }
    }

    /// The smallest interval containing both this interval and the other.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Clamps a value to the interval.
    pub fn clamp(&self, value: T) -> T {
        value.max(self.min).min(self.max)
    }

    pub fn lerp(&self, t: T) -> T {
        self.min + t * (self.max - self.min)
    }

    pub fn inv_lerp(&self, value: T) -> T {
        (value - self.min) / (self.max - self.min)
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

#[cfg(test)]
mod test {
    use super::Interval;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn lerp_round_trip() {
        let range: Interval<f64> = Interval::new(-2.0, 6.0);
        assert_approx_eq!(range.lerp(0.25), 0.0);
        assert_approx_eq!(range.inv_lerp(0.0), 0.25);
        assert_approx_eq!(range.length(), 8.0);
    }

    #[test]
    fn overlaps_and_clamps() {
        let a = Interval::new(0.0, 1.0);
        assert!(a.overlaps(&Interval::new(1.0, 2.0)));
        assert!(!a.overlaps(&Interval::new(1.5, 2.0)));
        assert_eq!(a.clamp(3.0), 1.0);
        assert_eq!(a.clamp(-3.0), 0.0);
        assert_eq!(a.union(&Interval::new(-1.0, 0.5)), Interval::new(-1.0, 1.0));
        assert_eq!(Interval::disc(1.0, 2.0), Interval::new(-1.0, 3.0));
    }
}
