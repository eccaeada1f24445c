//! River debris that damages the player on contact

use serde::{Deserialize, Serialize};

/// Downstream drift acceleration (px/s²)
pub const OBSTACLE_DRIFT: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObstacleType {
    Log,
    Rock,
    Branch,
}

impl ObstacleType {
    pub const ALL: [ObstacleType; 3] = [ObstacleType::Log, ObstacleType::Rock, ObstacleType::Branch];

    pub fn base_damage(self) -> f32 {
        match self {
            ObstacleType::Log => 10.0,
            ObstacleType::Rock => 15.0,
            ObstacleType::Branch => 5.0,
        }
    }

    /// Collision radius in px
    pub fn radius(self) -> f32 {
        match self {
            ObstacleType::Log => 25.0,
            ObstacleType::Rock => 30.0,
            ObstacleType::Branch => 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    obstacle_type: ObstacleType,
    damage: f32,
    pub drift: f32,
}

impl Obstacle {
    pub fn new(obstacle_type: ObstacleType) -> Self {
        Self {
            obstacle_type,
            damage: obstacle_type.base_damage(),
            drift: OBSTACLE_DRIFT,
        }
    }

    /// Scale contact damage, e.g. for the chosen difficulty
    pub fn with_damage_multiplier(mut self, multiplier: f32) -> Self {
        self.damage = self.obstacle_type.base_damage() * multiplier.max(0.0);
        self
    }

    pub fn obstacle_type(&self) -> ObstacleType {
        self.obstacle_type
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn radius(&self) -> f32 {
        self.obstacle_type.radius()
    }
}
