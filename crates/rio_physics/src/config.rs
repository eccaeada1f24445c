//! Physics configuration

use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};

/// Physics world configuration
///
/// Units are pixels and seconds. The defaults model a canoe on open water:
/// no gravity and enough drag that an unpowered body coasts to a stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity vector (default: none)
    pub gravity: [f32; 2],

    /// Largest timestep a single pipeline step may take, in seconds
    pub timestep: f32,

    /// Maximum number of substeps per update
    pub max_substeps: u32,

    /// Enable continuous collision detection
    pub ccd_enabled: bool,

    /// Default friction coefficient
    pub default_friction: f32,

    /// Default restitution (bounciness)
    pub default_restitution: f32,

    /// Ambient water drag applied to every body unless overridden
    pub linear_damping: f32,

    /// Rotational drag
    pub angular_damping: f32,

    /// Mass given to bodies that do not specify one
    pub default_mass: f32,

    /// Solver iterations
    pub solver_iterations: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0],
            timestep: 1.0 / 60.0,
            max_substeps: 4,
            ccd_enabled: false,
            default_friction: 0.1,
            default_restitution: 0.3,
            linear_damping: 1.2,
            angular_damping: 1.2,
            default_mass: 1.0,
            solver_iterations: 4,
        }
    }
}

impl PhysicsConfig {
    /// Create a configuration for high-precision simulation
    pub fn high_precision() -> Self {
        Self {
            solver_iterations: 8,
            max_substeps: 8,
            ccd_enabled: true,
            ..Default::default()
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = [x, y];
        self
    }

    /// Set timestep
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Set ambient drag
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Check the values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.timestep.is_nan() || self.timestep <= 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig("max_substeps must be at least 1".into()));
        }
        if self.solver_iterations == 0 {
            return Err(PhysicsError::InvalidConfig("solver_iterations must be at least 1".into()));
        }
        if self.linear_damping < 0.0 || self.angular_damping < 0.0 {
            return Err(PhysicsError::InvalidConfig("damping cannot be negative".into()));
        }
        Ok(())
    }
}
