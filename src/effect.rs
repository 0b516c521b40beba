//! Short-lived visual effects.

use crate::math::Point2d;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The number of ticks an explosion lasts.
pub const EXPLOSION_LIFE: u32 = 30;

/// The radius of a fresh explosion in m.
pub const EXPLOSION_RADIUS: f64 = 6.0;

/// The kind of a [TransientEffect].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EffectKind {
    Explosion,
}

/// An effect which fades out over a fixed number of ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransientEffect {
    kind: EffectKind,
    position: Point2d,
    life: u32,
    max_life: u32,
}

impl TransientEffect {
    /// Creates an explosion at the given position.
    pub fn explosion(position: Point2d) -> Self {
        Self {
            kind: EffectKind::Explosion,
            position,
            life: EXPLOSION_LIFE,
            max_life: EXPLOSION_LIFE,
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn position(&self) -> Point2d {
        self.position
    }

    /// The number of ticks left.
    pub fn life(&self) -> u32 {
        self.life
    }

    /// The remaining life as a fraction between 0 and 1.
    pub fn strength(&self) -> f64 {
        self.life as f64 / self.max_life as f64
    }

    /// The current radius of the effect in m.
    pub fn radius(&self) -> f64 {
        match self.kind {
            EffectKind::Explosion => self.strength() * EXPLOSION_RADIUS,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0
    }

    /// Counts down one tick.
    pub fn update(&mut self) {
        self.life = self.life.saturating_sub(1);
    }

    /// Restarts the effect.
    pub fn reset(&mut self) {
        self.life = self.max_life;
    }
}
