//! Game configuration
//!
//! Every section has sensible defaults, so a config file only needs the
//! fields it changes:
//!
//! ```toml
//! seed = 42
//!
//! [gameplay]
//! difficulty = "HARD"
//!
//! [navigation]
//! start_node = "manaus"
//! first_target = "tefe"
//! ```

use rio_engine::EngineConfig;
use rio_physics::PhysicsConfig;
use serde::{Deserialize, Serialize};

/// Top-level game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed RNG seed; unset draws one from the OS
    pub seed: Option<u64>,
    pub viewport: ViewportConfig,
    pub gameplay: GameplayConfig,
    pub audio: AudioConfig,
    pub player: PlayerConfig,
    pub spawn: SpawnConfig,
    pub navigation: NavigationConfig,
    pub physics: PhysicsConfig,
    pub engine: EngineConfig,
}

impl GameConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_difficulty(mut self, difficulty: DifficultyLevel) -> Self {
        self.gameplay.difficulty = difficulty;
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = ViewportConfig { width, height };
        self
    }
}

/// Fallback viewport, used when the renderer reports nothing usable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Explorer,
    Hard,
}

impl DifficultyLevel {
    /// Scale applied to obstacle damage
    pub fn damage_multiplier(self) -> f32 {
        match self {
            DifficultyLevel::Easy => 0.5,
            DifficultyLevel::Explorer => 1.0,
            DifficultyLevel::Hard => 1.5,
        }
    }

    /// Scale applied to spawn intervals; below 1 spawns faster
    pub fn spawn_interval_multiplier(self) -> f32 {
        match self {
            DifficultyLevel::Easy => 1.25,
            DifficultyLevel::Explorer => 1.0,
            DifficultyLevel::Hard => 0.75,
        }
    }
}

impl std::str::FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "explorer" | "normal" | "" => Ok(Self::Explorer),
            "hard" => Ok(Self::Hard),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    pub difficulty: DifficultyLevel,
    /// Multiplier on the player's turn rate
    pub steering_sensitivity: f32,
    /// Game time per difficulty step (ms)
    pub difficulty_ramp_ms: f64,
    /// Obstacle speed added per difficulty step
    pub difficulty_step: f32,
    /// Game time between encounter trigger checks (ms); random trigger
    /// probabilities are per check
    pub event_check_interval_ms: f64,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            difficulty: DifficultyLevel::Explorer,
            steering_sensitivity: 1.0,
            difficulty_ramp_ms: 30_000.0,
            difficulty_step: 0.2,
            event_check_interval_ms: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub master_volume: f32,
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            music_volume: 0.6,
            sfx_volume: 0.8,
            muted: false,
        }
    }
}

impl AudioConfig {
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    pub fn effective_music_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.music_volume).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub lives: u32,
    /// Top speed (px/s)
    pub max_speed: f32,
    /// Thrust acceleration (px/s²)
    pub acceleration: f32,
    /// Turn rate (rad/s)
    pub turn_rate: f32,
    /// Canoe hull size (px)
    pub width: f32,
    pub height: f32,
    /// Distance of the spawn point above the bottom edge (px)
    pub spawn_offset: f32,
    /// Ambient drag on the canoe
    pub linear_damping: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            lives: 3,
            max_speed: 300.0,
            acceleration: 600.0,
            turn_rate: 3.0,
            width: 40.0,
            height: 80.0,
            spawn_offset: 150.0,
            linear_damping: 3.0,
        }
    }
}

/// Spawn cadence. Intervals are ms of game time, speeds px/s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub obstacle_interval_ms: f32,
    pub obstacle_min_interval_ms: f32,
    /// Interval shrink per `obstacle_ramp_ms` of game time
    pub obstacle_interval_step_ms: f32,
    pub obstacle_ramp_ms: f64,
    pub collectible_interval_ms: f32,
    pub whirlpool_interval_ms: f32,
    /// Chance a collectible spawn is a specimen instead
    pub specimen_chance: f64,
    pub obstacle_speed: f32,
    /// Random spread around the obstacle speed (±)
    pub obstacle_speed_jitter: f32,
    pub collectible_speed: f32,
    pub whirlpool_speed: f32,
    pub fork_speed: f32,
    /// Spawn height above the top edge (px)
    pub spawn_y: f32,
    pub fork_spawn_y: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            obstacle_interval_ms: 2000.0,
            obstacle_min_interval_ms: 800.0,
            obstacle_interval_step_ms: 100.0,
            obstacle_ramp_ms: 10_000.0,
            collectible_interval_ms: 4000.0,
            whirlpool_interval_ms: 15_000.0,
            specimen_chance: 0.1,
            obstacle_speed: 90.0,
            obstacle_speed_jitter: 15.0,
            collectible_speed: 72.0,
            whirlpool_speed: 48.0,
            fork_speed: 60.0,
            spawn_y: -50.0,
            fork_spawn_y: -150.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub start_node: String,
    /// First destination; unset departs along the only outgoing segment
    pub first_target: Option<String>,
    /// Remaining distance at which the fork ahead is announced
    pub fork_lookahead: f32,
    /// Distance a fork marker scrolls before the first choice is taken for the player (px)
    pub fork_resolve_distance: f32,
    /// River distance units per pixel the canoe moves
    pub distance_scale: f32,
    /// Speed the river carries the canoe at without paddling (px/s)
    pub cruise_speed: f32,
    /// Share of the river current applied to the canoe as force
    pub flow_force_scale: f32,
    /// Time spent at a node before moving on (ms)
    pub dwell_ms: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            start_node: "belem".to_string(),
            first_target: Some("breves".to_string()),
            fork_lookahead: rio_navigation::FORK_DECISION_DISTANCE,
            fork_resolve_distance: 650.0,
            distance_scale: 0.1,
            cruise_speed: 60.0,
            flow_force_scale: 6.0,
            dwell_ms: 3000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "seed": 7, "gameplay": { "difficulty": "HARD" }, "navigation": { "dwell_ms": 0 } }"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.gameplay.difficulty, DifficultyLevel::Hard);
        assert_eq!(config.gameplay.steering_sensitivity, 1.0);
        assert_eq!(config.navigation.dwell_ms, 0.0);
        assert_eq!(config.navigation.start_node, "belem");
        assert_eq!(config.spawn.obstacle_interval_ms, 2000.0);
        assert_eq!(config.engine.target_fps, 60);
    }

    #[test]
    fn test_difficulty_scaling() {
        assert!(DifficultyLevel::Easy.damage_multiplier() < DifficultyLevel::Hard.damage_multiplier());
        assert!(DifficultyLevel::Hard.spawn_interval_multiplier() < 1.0);
        assert_eq!(DifficultyLevel::default(), DifficultyLevel::Explorer);
        assert_eq!("HARD".parse::<DifficultyLevel>(), Ok(DifficultyLevel::Hard));
        assert!("nightmare".parse::<DifficultyLevel>().is_err());
    }

    #[test]
    fn test_muted_audio() {
        let audio = AudioConfig {
            muted: true,
            ..Default::default()
        };
        assert_relative_eq!(audio.effective_sfx_volume(), 0.0);
        assert!(AudioConfig::default().effective_music_volume() > 0.0);
    }
}
