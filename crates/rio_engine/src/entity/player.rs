//! The player's canoe

use crate::inventory::Inventory;
use rio_math::{clamp_unit, Vec2};
use serde::{Deserialize, Serialize};

pub const MAX_HEALTH: f32 = 100.0;
pub const DEFAULT_LIVES: u32 = 3;
pub const MAX_LIVES: u32 = 5;
pub const MAX_RATIONS: f32 = 100.0;
/// Invincibility granted after losing a life
pub const INVINCIBILITY_MS: f32 = 2000.0;
/// How long the hit flash stays on
pub const DAMAGE_FLASH_MS: f32 = 500.0;
pub const SPEED_BOOST_MULTIPLIER: f32 = 1.5;

/// Result of applying damage to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Invincible, nothing happened
    Blocked,
    /// Health went down
    Hurt,
    /// Health hit zero and a life was spent
    LifeLost,
    /// Health hit zero with no lives left
    Defeated,
}

impl DamageOutcome {
    /// Whether health was actually touched
    pub fn landed(self) -> bool {
        !matches!(self, DamageOutcome::Blocked)
    }
}

/// Read-only view for HUDs and event contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub health: f32,
    pub lives: u32,
    pub rations: f32,
    pub distance: f32,
    pub combo: u32,
    pub max_combo: u32,
    pub obstacles_avoided: u32,
    pub collectibles_gathered: u32,
    pub invincible: bool,
    pub speed_boosted: bool,
}

/// Player state. Position and velocity live on the owning [`Entity`](super::Entity).
#[derive(Debug, Clone)]
pub struct Player {
    /// Base top speed (px/s)
    pub max_speed: f32,
    /// Thrust acceleration (px/s²)
    pub acceleration: f32,
    /// Turn rate (rad/s)
    pub turn_rate: f32,
    /// Knockback speed on impact (px/s)
    pub knockback: f32,

    thrust: f32,
    turn: f32,

    health: f32,
    lives: u32,
    rations: f32,
    inventory: Inventory,

    distance: f32,
    combo: u32,
    max_combo: u32,
    obstacles_avoided: u32,
    collectibles_gathered: u32,

    // Countdowns, all in ms
    damage_flash_ms: f32,
    invincible_ms: f32,
    speed_boost_ms: f32,
    speed_modifier: f32,
    speed_modifier_ms: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            max_speed: 300.0,
            acceleration: 600.0,
            turn_rate: 3.0,
            knockback: 120.0,
            thrust: 0.0,
            turn: 0.0,
            health: MAX_HEALTH,
            lives: DEFAULT_LIVES,
            rations: MAX_RATIONS,
            inventory: Inventory::starter(),
            distance: 0.0,
            combo: 0,
            max_combo: 0,
            obstacles_avoided: 0,
            collectibles_gathered: 0,
            damage_flash_ms: 0.0,
            invincible_ms: 0.0,
            speed_boost_ms: 0.0,
            speed_modifier: 1.0,
            speed_modifier_ms: 0.0,
        }
    }

    pub fn with_lives(mut self, lives: u32) -> Self {
        self.lives = lives.min(MAX_LIVES);
        self
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    // --- Controls ---

    pub fn set_thrust(&mut self, amount: f32) {
        self.thrust = clamp_unit(amount);
    }

    pub fn set_turn(&mut self, amount: f32) {
        self.turn = clamp_unit(amount);
    }

    pub fn thrust(&self) -> f32 {
        self.thrust
    }

    pub fn turn(&self) -> f32 {
        self.turn
    }

    pub fn reset_controls(&mut self) {
        self.thrust = 0.0;
        self.turn = 0.0;
    }

    /// Force along the heading for the current thrust intent
    pub fn thrust_force(&self, angle: f32) -> Vec2 {
        Vec2::from_heading(angle) * (self.thrust * self.acceleration)
    }

    /// Heading change for this tick, in radians
    pub fn turn_amount(&self, delta_ms: f32, sensitivity: f32) -> f32 {
        self.turn * self.turn_rate * (delta_ms / 1000.0) * sensitivity
    }

    // --- Health ---

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_ms > 0.0
    }

    pub fn invincibility_remaining_ms(&self) -> f32 {
        self.invincible_ms
    }

    pub fn grant_invincibility(&mut self, duration_ms: f32) {
        self.invincible_ms = self.invincible_ms.max(duration_ms);
    }

    pub fn is_recently_damaged(&self) -> bool {
        self.damage_flash_ms > 0.0
    }

    /// Apply damage. Ignored while invincible; breaks the combo otherwise.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.is_invincible() {
            return DamageOutcome::Blocked;
        }

        self.health = (self.health - amount.max(0.0)).max(0.0);
        self.combo = 0;
        self.damage_flash_ms = DAMAGE_FLASH_MS;
        log::debug!("Player took {:.1} damage, health {:.1}", amount, self.health);

        if self.health > 0.0 {
            DamageOutcome::Hurt
        } else if self.lose_life() {
            DamageOutcome::LifeLost
        } else {
            DamageOutcome::Defeated
        }
    }

    /// Spend a life. Returns true when the player keeps going.
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            log::info!("Player has no lives left");
            return false;
        }

        self.health = MAX_HEALTH;
        self.combo = 0;
        self.invincible_ms = INVINCIBILITY_MS;
        log::info!("Player lost a life, {} remaining", self.lives);
        true
    }

    /// Returns false when already at the cap.
    pub fn add_life(&mut self) -> bool {
        if self.lives >= MAX_LIVES {
            return false;
        }
        self.lives += 1;
        true
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount.max(0.0)).min(MAX_HEALTH);
    }

    /// Obstacle impact: damage plus a knockback along `separation`
    /// (player position minus obstacle position).
    pub fn on_obstacle(&mut self, damage: f32, separation: Vec2, velocity: &mut Vec2) -> DamageOutcome {
        let outcome = self.take_damage(damage);
        if outcome.landed() && !separation.is_zero() {
            *velocity += separation.normalize() * self.knockback;
        }
        outcome
    }

    // --- Rations ---

    pub fn rations(&self) -> f32 {
        self.rations
    }

    /// Returns the remaining rations.
    pub fn consume_rations(&mut self, amount: f32) -> f32 {
        self.rations = (self.rations - amount.max(0.0)).max(0.0);
        self.rations
    }

    pub fn add_rations(&mut self, amount: f32) {
        self.rations = (self.rations + amount.max(0.0)).min(MAX_RATIONS);
    }

    // --- Speed effects ---

    pub fn apply_speed_boost(&mut self, duration_ms: f32) {
        self.speed_boost_ms = self.speed_boost_ms.max(duration_ms);
    }

    pub fn is_speed_boosted(&self) -> bool {
        self.speed_boost_ms > 0.0
    }

    /// Temporary multiplier on top speed, e.g. fog or rapids
    pub fn apply_speed_modifier(&mut self, factor: f32, duration_ms: f32) {
        self.speed_modifier = factor.max(0.0);
        self.speed_modifier_ms = duration_ms;
    }

    pub fn effective_max_speed(&self) -> f32 {
        let boost = if self.is_speed_boosted() {
            SPEED_BOOST_MULTIPLIER
        } else {
            1.0
        };
        self.max_speed * boost * self.speed_modifier
    }

    // --- Counters ---

    pub fn add_distance(&mut self, distance: f32) {
        self.distance += distance.max(0.0);
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn record_obstacle_avoided(&mut self) {
        self.obstacles_avoided += 1;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }

    pub fn obstacles_avoided(&self) -> u32 {
        self.obstacles_avoided
    }

    pub fn record_collectible(&mut self) {
        self.collectibles_gathered += 1;
    }

    pub fn collectibles_gathered(&self) -> u32 {
        self.collectibles_gathered
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            health: self.health,
            lives: self.lives,
            rations: self.rations,
            distance: self.distance,
            combo: self.combo,
            max_combo: self.max_combo,
            obstacles_avoided: self.obstacles_avoided,
            collectibles_gathered: self.collectibles_gathered,
            invincible: self.is_invincible(),
            speed_boosted: self.is_speed_boosted(),
        }
    }

    /// Tick countdowns and cap speed. Returns true when `velocity` changed.
    pub(crate) fn update(&mut self, delta_ms: f32, velocity: &mut Vec2) -> bool {
        let dt = delta_ms.max(0.0);
        self.damage_flash_ms = (self.damage_flash_ms - dt).max(0.0);
        self.invincible_ms = (self.invincible_ms - dt).max(0.0);
        self.speed_boost_ms = (self.speed_boost_ms - dt).max(0.0);

        if self.speed_modifier_ms > 0.0 {
            self.speed_modifier_ms = (self.speed_modifier_ms - dt).max(0.0);
            if self.speed_modifier_ms == 0.0 {
                self.speed_modifier = 1.0;
            }
        }

        let max = self.effective_max_speed();
        if velocity.length() > max {
            *velocity = velocity.clamp_length(max);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rock_hit_scenario() {
        let mut player = Player::new();
        player.record_obstacle_avoided();
        player.record_obstacle_avoided();
        assert_eq!(player.combo(), 2);

        let outcome = player.take_damage(15.0);
        assert_eq!(outcome, DamageOutcome::Hurt);
        assert_relative_eq!(player.health(), 85.0);
        assert_eq!(player.combo(), 0);
        assert_eq!(player.lives(), 3);
        assert_eq!(player.max_combo(), 2);
    }

    #[test]
    fn test_lose_life_scenario() {
        let mut player = Player::new();
        let outcome = player.take_damage(100.0);
        assert_eq!(outcome, DamageOutcome::LifeLost);
        assert_eq!(player.lives(), 2);
        assert_relative_eq!(player.health(), MAX_HEALTH);
        assert_relative_eq!(player.invincibility_remaining_ms(), 2000.0);
    }

    #[test]
    fn test_lose_life_direct() {
        let mut player = Player::new();
        assert!(player.lose_life());
        assert_eq!(player.lives(), 2);
        assert!(player.is_invincible());
    }

    #[test]
    fn test_invincible_blocks_damage() {
        let mut player = Player::new();
        player.grant_invincibility(1000.0);
        assert_eq!(player.take_damage(50.0), DamageOutcome::Blocked);
        assert_relative_eq!(player.health(), MAX_HEALTH);

        let mut velocity = Vec2::ZERO;
        player.update(1000.0, &mut velocity);
        assert!(!player.is_invincible());
        assert_eq!(player.take_damage(10.0), DamageOutcome::Hurt);
    }

    #[test]
    fn test_defeated_on_last_life() {
        let mut player = Player::new().with_lives(1);
        assert_eq!(player.take_damage(120.0), DamageOutcome::Defeated);
        assert!(!player.is_alive());
        assert_eq!(player.lives(), 0);
    }

    #[test]
    fn test_knockback() {
        let mut player = Player::new();
        let mut velocity = Vec2::ZERO;
        player.on_obstacle(10.0, Vec2::new(0.0, 5.0), &mut velocity);
        assert_relative_eq!(velocity.y, player.knockback);
        assert_relative_eq!(velocity.x, 0.0);

        // No knockback while invincible
        player.grant_invincibility(500.0);
        let mut velocity = Vec2::ZERO;
        player.on_obstacle(10.0, Vec2::new(3.0, 0.0), &mut velocity);
        assert!(velocity.is_zero());
    }

    #[test]
    fn test_controls_clamped() {
        let mut player = Player::new();
        player.set_thrust(4.0);
        player.set_turn(-3.0);
        assert_relative_eq!(player.thrust(), 1.0);
        assert_relative_eq!(player.turn(), -1.0);

        // Heading 0 points up the screen.
        let force = player.thrust_force(0.0);
        assert_relative_eq!(force.x, 0.0);
        assert_relative_eq!(force.y, -player.acceleration);

        assert_relative_eq!(player.turn_amount(1000.0, 1.0), -player.turn_rate);
    }

    #[test]
    fn test_speed_boost_countdown() {
        let mut player = Player::new();
        player.apply_speed_boost(5000.0);
        assert_relative_eq!(player.effective_max_speed(), 450.0);

        let mut velocity = Vec2::new(0.0, 400.0);
        assert!(!player.update(4000.0, &mut velocity));
        assert!(player.is_speed_boosted());

        assert!(player.update(1000.0, &mut velocity));
        assert!(!player.is_speed_boosted());
        assert_relative_eq!(velocity.length(), 300.0, epsilon = 1e-3);
    }

    #[test]
    fn test_speed_modifier_expires() {
        let mut player = Player::new();
        player.apply_speed_modifier(0.5, 100.0);
        assert_relative_eq!(player.effective_max_speed(), 150.0);
        let mut velocity = Vec2::ZERO;
        player.update(100.0, &mut velocity);
        assert_relative_eq!(player.effective_max_speed(), 300.0);
    }

    #[test]
    fn test_rations_and_heal_caps() {
        let mut player = Player::new();
        assert_relative_eq!(player.consume_rations(30.0), 70.0);
        player.add_rations(50.0);
        assert_relative_eq!(player.rations(), MAX_RATIONS);

        player.take_damage(40.0);
        player.heal(100.0);
        assert_relative_eq!(player.health(), MAX_HEALTH);
    }

    #[test]
    fn test_damage_flash_clears() {
        let mut player = Player::new();
        player.take_damage(5.0);
        assert!(player.is_recently_damaged());
        let mut velocity = Vec2::ZERO;
        player.update(499.0, &mut velocity);
        assert!(player.is_recently_damaged());
        player.update(1.0, &mut velocity);
        assert!(!player.is_recently_damaged());
    }

    #[test]
    fn test_lives_cap() {
        let mut player = Player::new().with_lives(4);
        assert!(player.add_life());
        assert!(!player.add_life());
        assert_eq!(player.lives(), MAX_LIVES);
    }
}
