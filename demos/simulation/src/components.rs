//! Component definitions for the particle simulation.

use ecs_component::Component;
use glam::Vec3;

/// World-space position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec3);

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// A 3D velocity component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    /// Linear velocity in world units per second.
    pub linear: Vec3,
}

impl Velocity {
    /// Zero velocity.
    pub const ZERO: Self = Self { linear: Vec3::ZERO };

    /// Create a new velocity.
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            linear: Vec3::new(x, y, z),
        }
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// Seconds an entity has left before it is destroyed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    /// Remaining time in seconds.
    pub remaining: f32,
}

impl Lifetime {
    /// A lifetime of `seconds`.
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Returns `true` once no time remains.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

impl Component for Lifetime {
    fn type_name() -> &'static str {
        "Lifetime"
    }
}
