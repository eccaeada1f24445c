//! Spawn pacing
//!
//! The spawner only decides *what* appears and *when*; the coordinator turns
//! each [`SpawnRequest`] into an entity and a physics body.

use crate::config::{DifficultyLevel, GameplayConfig, SpawnConfig};
use rand::seq::SliceRandom;
use rand::Rng;
use rio_engine::entity::{COLLECTIBLE_RADIUS, FORK_RADIUS, WHIRLPOOL_RADIUS};
use rio_engine::{BodyOptions, BodyShape, CollectibleType, Entity, Obstacle, ObstacleType};
use rio_math::Vec2;
use rio_navigation::ForkChoice;

const OBSTACLE_WEIGHTS: [(ObstacleType, u32); 3] = [
    (ObstacleType::Log, 2),
    (ObstacleType::Rock, 1),
    (ObstacleType::Branch, 2),
];

const COLLECTIBLE_WEIGHTS: [(CollectibleType, u32); 3] = [
    (CollectibleType::Fish, 2),
    (CollectibleType::HealthPack, 1),
    (CollectibleType::SpeedBoost, 1),
];

/// Water drag per spawned kind
const OBSTACLE_DAMPING: f32 = 0.1;
const FLOATER_DAMPING: f32 = 0.05;

/// Horizontal margin kept clear at both edges (px)
const EDGE_MARGIN: f32 = 50.0;

/// Something the spawner wants in the world
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub entity: Entity,
    pub shape: BodyShape,
    pub options: BodyOptions,
}

impl SpawnRequest {
    pub fn id(&self) -> &str {
        self.entity.id()
    }

    pub fn into_parts(self) -> (Entity, BodyShape, BodyOptions) {
        (self.entity, self.shape, self.options)
    }
}

#[derive(Debug, Clone)]
pub struct Spawner {
    config: SpawnConfig,
    difficulty: DifficultyLevel,
    ramp_ms: f64,
    ramp_step: f32,
    obstacle_timer: f32,
    obstacle_interval: f32,
    collectible_timer: f32,
    whirlpool_timer: f32,
    next_id: u64,
}

impl Spawner {
    pub fn new(config: SpawnConfig, gameplay: &GameplayConfig) -> Self {
        let obstacle_interval = config.obstacle_interval_ms * gameplay.difficulty.spawn_interval_multiplier();
        Self {
            config,
            difficulty: gameplay.difficulty,
            ramp_ms: gameplay.difficulty_ramp_ms,
            ramp_step: gameplay.difficulty_step,
            obstacle_timer: 0.0,
            obstacle_interval,
            collectible_timer: 0.0,
            whirlpool_timer: 0.0,
            next_id: 0,
        }
    }

    /// Obstacle speed multiplier: `1 + floor(t / ramp) * step`
    pub fn speed_multiplier(&self, game_time_ms: f64) -> f32 {
        if self.ramp_ms <= 0.0 {
            return 1.0;
        }
        1.0 + (game_time_ms / self.ramp_ms).floor() as f32 * self.ramp_step
    }

    /// Current gap between obstacle spawns (ms)
    pub fn obstacle_interval(&self) -> f32 {
        self.obstacle_interval
    }

    /// Advance the timers and return whatever is due.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        delta_ms: f32,
        game_time_ms: f64,
        width: f32,
        rng: &mut R,
    ) -> Vec<SpawnRequest> {
        let mut spawned = Vec::new();
        let dt = delta_ms.max(0.0);
        let interval_scale = self.difficulty.spawn_interval_multiplier();

        self.obstacle_timer += dt;
        if self.obstacle_timer >= self.obstacle_interval {
            spawned.push(self.obstacle(width, game_time_ms, rng));
            self.obstacle_timer = 0.0;

            let steps = if self.config.obstacle_ramp_ms > 0.0 {
                (game_time_ms / self.config.obstacle_ramp_ms).floor() as f32
            } else {
                0.0
            };
            let base = (self.config.obstacle_interval_ms - steps * self.config.obstacle_interval_step_ms)
                .max(self.config.obstacle_min_interval_ms);
            self.obstacle_interval = base * interval_scale;
        }

        self.collectible_timer += dt;
        if self.collectible_timer >= self.config.collectible_interval_ms * interval_scale {
            spawned.push(self.collectible(width, rng));
            self.collectible_timer = 0.0;
        }

        self.whirlpool_timer += dt;
        if self.whirlpool_timer >= self.config.whirlpool_interval_ms * interval_scale {
            spawned.push(self.whirlpool(width, rng));
            self.whirlpool_timer = 0.0;
        }

        spawned
    }

    /// A weighted-random obstacle somewhere along the top edge
    pub fn obstacle<R: Rng + ?Sized>(&mut self, width: f32, game_time_ms: f64, rng: &mut R) -> SpawnRequest {
        let obstacle_type = OBSTACLE_WEIGHTS
            .choose_weighted(rng, |(_, weight)| *weight)
            .map(|(t, _)| *t)
            .unwrap_or(ObstacleType::Log);
        let obstacle = Obstacle::new(obstacle_type).with_damage_multiplier(self.difficulty.damage_multiplier());

        let jitter = self.config.obstacle_speed_jitter.abs();
        let spread = if jitter > 0.0 { rng.gen_range(-jitter..jitter) } else { 0.0 };
        let speed = self.config.obstacle_speed * self.speed_multiplier(game_time_ms) + spread;

        let position = Vec2::new(self.lane(width, EDGE_MARGIN, rng), self.config.spawn_y);
        let id = self.next_id("obstacle");
        SpawnRequest {
            shape: BodyShape::circle(obstacle.radius()),
            options: BodyOptions::solid()
                .with_velocity(Vec2::new(0.0, speed))
                .with_linear_damping(OBSTACLE_DAMPING),
            entity: Entity::obstacle(id, position, obstacle),
        }
    }

    /// A weighted-random pickup, occasionally a specimen
    pub fn collectible<R: Rng + ?Sized>(&mut self, width: f32, rng: &mut R) -> SpawnRequest {
        let collectible_type = if rng.gen_bool(self.config.specimen_chance.clamp(0.0, 1.0)) {
            CollectibleType::Specimen
        } else {
            COLLECTIBLE_WEIGHTS
                .choose_weighted(rng, |(_, weight)| *weight)
                .map(|(t, _)| *t)
                .unwrap_or(CollectibleType::Fish)
        };

        let position = Vec2::new(self.lane(width, EDGE_MARGIN, rng), self.config.spawn_y);
        let id = self.next_id("collectible");
        SpawnRequest {
            entity: Entity::collectible(id, position, collectible_type),
            shape: BodyShape::circle(COLLECTIBLE_RADIUS),
            options: BodyOptions::sensor()
                .with_velocity(Vec2::new(0.0, self.config.collectible_speed))
                .with_linear_damping(FLOATER_DAMPING),
        }
    }

    pub fn whirlpool<R: Rng + ?Sized>(&mut self, width: f32, rng: &mut R) -> SpawnRequest {
        let position = Vec2::new(self.lane(width, EDGE_MARGIN * 2.0, rng), self.config.spawn_y * 2.0);
        let id = self.next_id("whirlpool");
        SpawnRequest {
            entity: Entity::whirlpool(id, position),
            shape: BodyShape::circle(WHIRLPOOL_RADIUS),
            options: BodyOptions::sensor()
                .with_velocity(Vec2::new(0.0, self.config.whirlpool_speed))
                .with_linear_damping(FLOATER_DAMPING),
        }
    }

    /// A fork marker centred above the screen
    pub fn fork(&mut self, width: f32, choices: Vec<ForkChoice>) -> SpawnRequest {
        let position = Vec2::new(width * 0.5, self.config.fork_spawn_y);
        let id = self.next_id("fork");
        SpawnRequest {
            entity: Entity::fork(id, position, choices),
            shape: BodyShape::circle(FORK_RADIUS),
            options: BodyOptions::sensor()
                .with_velocity(Vec2::new(0.0, self.config.fork_speed))
                .with_linear_damping(FLOATER_DAMPING),
        }
    }

    fn lane<R: Rng + ?Sized>(&self, width: f32, margin: f32, rng: &mut R) -> f32 {
        if width > margin * 2.0 {
            rng.gen_range(margin..width - margin)
        } else {
            width * 0.5
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }
}
