//! Body descriptions and handles

use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use rapier2d::prelude as rapier;
use rio_math::Vec2;
use serde::{Deserialize, Serialize};

/// Arena handle to a body owned by the physics system.
///
/// The generation is bumped every time a slot is reused, so a handle kept by
/// an entity after its body was removed resolves to nothing instead of to
/// whichever body took the slot next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl BodyHandle {
    /// Slot index in the arena
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyShape {
    /// Axis-aligned rectangle (before rotation), full width and height
    Rect { width: f32, height: f32 },
    /// Circle
    Circle { radius: f32 },
}

impl BodyShape {
    pub fn rect(width: f32, height: f32) -> Self {
        Self::Rect { width, height }
    }

    pub fn circle(radius: f32) -> Self {
        Self::Circle { radius }
    }

    pub(crate) fn to_rapier_builder(self) -> Result<rapier::ColliderBuilder> {
        match self {
            Self::Rect { width, height } if width > 0.0 && height > 0.0 => {
                Ok(rapier::ColliderBuilder::cuboid(width * 0.5, height * 0.5))
            }
            Self::Circle { radius } if radius > 0.0 => Ok(rapier::ColliderBuilder::ball(radius)),
            other => Err(PhysicsError::ShapeCreationFailed(format!("{:?}", other))),
        }
    }
}

/// Options for creating a body
///
/// Anything left as `None` falls back to the [`PhysicsConfig`] defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyOptions {
    /// Detect contact without collision response
    pub sensor: bool,
    /// Initial heading in radians
    pub angle: f32,
    /// Initial velocity
    pub velocity: Vec2,
    /// Water drag override
    pub linear_damping: Option<f32>,
    /// Friction override
    pub friction: Option<f32>,
    /// Restitution override
    pub restitution: Option<f32>,
    /// Mass override
    pub mass: Option<f32>,
    /// Prevent contacts from spinning the body
    pub fixed_rotation: bool,
}

impl BodyOptions {
    /// Solid body with full collision response
    pub fn solid() -> Self {
        Self::default()
    }

    /// Sensor body
    pub fn sensor() -> Self {
        Self {
            sensor: true,
            fixed_rotation: true,
            ..Default::default()
        }
    }

    /// Set initial velocity
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set initial heading
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Override water drag
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = Some(damping);
        self
    }

    /// Override restitution
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = Some(restitution);
        self
    }

    /// Override mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Lock rotation
    pub fn with_fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    pub(crate) fn to_rapier_body(&self, position: Vec2, config: &PhysicsConfig) -> rapier::RigidBodyBuilder {
        let mut builder = rapier::RigidBodyBuilder::dynamic()
            .translation(rapier::Vector::new(position.x, position.y))
            .rotation(self.angle)
            .linvel(rapier::Vector::new(self.velocity.x, self.velocity.y))
            .linear_damping(self.linear_damping.unwrap_or(config.linear_damping))
            .angular_damping(config.angular_damping)
            .ccd_enabled(config.ccd_enabled)
            .can_sleep(false);

        if self.fixed_rotation {
            builder = builder.lock_rotations();
        }

        builder
    }

    pub(crate) fn apply_to_collider(
        &self,
        builder: rapier::ColliderBuilder,
        config: &PhysicsConfig,
    ) -> rapier::ColliderBuilder {
        builder
            .sensor(self.sensor)
            .friction(self.friction.unwrap_or(config.default_friction))
            .restitution(self.restitution.unwrap_or(config.default_restitution))
            .mass(self.mass.unwrap_or(config.default_mass))
    }
}

/// Authoritative kinematic state read back from the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
}
