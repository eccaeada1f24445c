//! Gameplay entities
//!
//! Every entity shares identity, kinematics, an optional physics body and an
//! active flag; the kind-specific state lives in the closed [`EntityKind`]
//! enum so renderers and the coordinator switch over kinds exhaustively.

mod collectible;
mod fork;
mod obstacle;
mod player;
mod whirlpool;

pub use collectible::{Collectible, CollectibleType, COLLECTIBLE_RADIUS};
pub use fork::{Fork, FORK_RADIUS};
pub use obstacle::{Obstacle, ObstacleType};
pub use player::{
    DamageOutcome, Player, PlayerStats, DAMAGE_FLASH_MS, DEFAULT_LIVES, INVINCIBILITY_MS,
    MAX_HEALTH, MAX_LIVES, MAX_RATIONS, SPEED_BOOST_MULTIPLIER,
};
pub use whirlpool::{Whirlpool, WHIRLPOOL_RADIUS};

use rio_math::Vec2;
use rio_navigation::ForkChoice;
use rio_physics::{BodyHandle, PhysicsSystem};
use serde::{Deserialize, Serialize};

/// Margin below the viewport after which debris is gone for good
pub const OFF_SCREEN_MARGIN: f32 = 100.0;
/// Whirlpools linger a little longer
pub const WHIRLPOOL_OFF_SCREEN_MARGIN: f32 = 150.0;
/// Forks also vanish when pushed this far above the top edge
pub const FORK_TOP_LIMIT: f32 = -200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Player,
    Obstacle,
    Collectible,
    Npc,
}

/// Kind-specific state
#[derive(Debug, Clone)]
pub enum EntityKind {
    Player(Box<Player>),
    Obstacle(Obstacle),
    Collectible(Collectible),
    Whirlpool(Whirlpool),
    Fork(Fork),
}

impl EntityKind {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityKind::Player(_) => EntityType::Player,
            EntityKind::Obstacle(_) | EntityKind::Whirlpool(_) => EntityType::Obstacle,
            EntityKind::Collectible(_) => EntityType::Collectible,
            EntityKind::Fork(_) => EntityType::Npc,
        }
    }
}

/// What an entity exposes to the other side of a contact.
///
/// Both sides of a pair are captured before either reacts, so dispatch order
/// does not leak into the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactInfo {
    pub id: String,
    pub entity_type: EntityType,
    pub tag: ContactTag,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactTag {
    Player,
    Obstacle { obstacle_type: ObstacleType, damage: f32 },
    Collectible { collectible_type: CollectibleType, value: f32, collected: bool },
    Whirlpool,
    Fork,
}

/// Gameplay consequence of a contact, reported back to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionEffect {
    /// The player was hit
    Damaged { amount: f32, outcome: DamageOutcome },
    /// A collectible was picked up
    Collected { collectible_type: CollectibleType, value: f32 },
}

/// Read-only view handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: String,
    pub entity_type: EntityType,
    pub kind: SnapshotKind,
    pub position: Vec2,
    pub angle: f32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SnapshotKind {
    Player { invincible: bool, damaged: bool, speed_boosted: bool },
    Obstacle { obstacle_type: ObstacleType, radius: f32 },
    Collectible { collectible_type: CollectibleType },
    Whirlpool { radius: f32 },
    Fork { choices: usize, decided: bool },
}

/// A live gameplay object
#[derive(Debug, Clone)]
pub struct Entity {
    id: String,
    position: Vec2,
    velocity: Vec2,
    angle: f32,
    body: Option<BodyHandle>,
    active: bool,
    /// Local kinematics changed and must be pushed to the body
    dirty: bool,
    kind: EntityKind,
}

impl Entity {
    pub fn new(id: impl Into<String>, position: Vec2, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            body: None,
            active: true,
            dirty: false,
            kind,
        }
    }

    pub fn player(id: impl Into<String>, position: Vec2) -> Self {
        Self::new(id, position, EntityKind::Player(Box::new(Player::new())))
    }

    pub fn obstacle(id: impl Into<String>, position: Vec2, obstacle: Obstacle) -> Self {
        Self::new(id, position, EntityKind::Obstacle(obstacle))
    }

    pub fn collectible(id: impl Into<String>, position: Vec2, collectible_type: CollectibleType) -> Self {
        Self::new(id, position, EntityKind::Collectible(Collectible::new(collectible_type)))
    }

    pub fn whirlpool(id: impl Into<String>, position: Vec2) -> Self {
        Self::new(id, position, EntityKind::Whirlpool(Whirlpool::new()))
    }

    pub fn fork(id: impl Into<String>, position: Vec2, choices: Vec<ForkChoice>) -> Self {
        Self::new(id, position, EntityKind::Fork(Fork::new(choices, position.y)))
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
        self.dirty = true;
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        self.dirty = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(p) => Some(&**p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(&mut **p),
            _ => None,
        }
    }

    pub fn as_obstacle(&self) -> Option<&Obstacle> {
        match &self.kind {
            EntityKind::Obstacle(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_collectible(&self) -> Option<&Collectible> {
        match &self.kind {
            EntityKind::Collectible(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_whirlpool(&self) -> Option<&Whirlpool> {
        match &self.kind {
            EntityKind::Whirlpool(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_whirlpool_mut(&mut self) -> Option<&mut Whirlpool> {
        match &mut self.kind {
            EntityKind::Whirlpool(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_fork(&self) -> Option<&Fork> {
        match &self.kind {
            EntityKind::Fork(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_fork_mut(&mut self) -> Option<&mut Fork> {
        match &mut self.kind {
            EntityKind::Fork(f) => Some(f),
            _ => None,
        }
    }

    // ==================== Physics binding ====================

    pub(crate) fn attach_body(&mut self, handle: BodyHandle) {
        self.body = Some(handle);
    }

    /// Pull authoritative kinematics from the body, if bound
    pub fn sync_from_physics(&mut self, physics: &PhysicsSystem) {
        let Some(state) = self.body.and_then(|h| physics.state(h)) else {
            return;
        };
        self.position = state.position;
        self.velocity = state.velocity;
        self.angle = state.angle;
    }

    /// Push locally changed velocity and heading back to the body
    pub fn flush_to_physics(&mut self, physics: &mut PhysicsSystem) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        if self.body.is_some() {
            physics.set_velocity(&self.id, self.velocity);
            physics.set_angle(&self.id, self.angle);
        }
    }

    /// Release the body and deactivate
    pub fn destroy(&mut self, physics: &mut PhysicsSystem) {
        if self.body.take().is_some() {
            physics.remove_body(&self.id);
        }
        self.active = false;
    }

    // ==================== Behaviour ====================

    /// Sync from physics, then apply the kind's continuous effect.
    pub fn update(&mut self, delta_ms: f32, physics: &mut PhysicsSystem) {
        if !self.active {
            return;
        }
        self.sync_from_physics(physics);

        let dt = delta_ms.max(0.0) / 1000.0;
        match &mut self.kind {
            EntityKind::Player(player) => {
                if player.update(delta_ms, &mut self.velocity) {
                    self.dirty = true;
                }
            }
            EntityKind::Obstacle(obstacle) => {
                self.velocity.y += obstacle.drift * dt;
                self.dirty = true;
            }
            EntityKind::Collectible(collectible) => {
                self.velocity.y += collectible.drift * dt;
                self.dirty = true;
            }
            EntityKind::Whirlpool(whirlpool) => {
                self.angle += whirlpool.rotation_speed * dt;
                self.velocity.y += whirlpool.drift * dt;
                whirlpool.tick(delta_ms);
                self.dirty = true;
            }
            EntityKind::Fork(fork) => {
                self.velocity.y += fork.drift * dt;
                fork.track(self.position.y);
                self.dirty = true;
            }
        }

        self.flush_to_physics(physics);
    }

    pub fn contact_info(&self) -> ContactInfo {
        let tag = match &self.kind {
            EntityKind::Player(_) => ContactTag::Player,
            EntityKind::Obstacle(o) => ContactTag::Obstacle {
                obstacle_type: o.obstacle_type(),
                damage: o.damage(),
            },
            EntityKind::Collectible(c) => ContactTag::Collectible {
                collectible_type: c.collectible_type(),
                value: c.value(),
                collected: c.is_collected(),
            },
            EntityKind::Whirlpool(_) => ContactTag::Whirlpool,
            EntityKind::Fork(_) => ContactTag::Fork,
        };
        ContactInfo {
            id: self.id.clone(),
            entity_type: self.entity_type(),
            tag,
            position: self.position,
        }
    }

    /// React to contact with `other`.
    ///
    /// The player takes obstacle damage with knockback; a collectible touched
    /// by the player marks itself collected and deactivates. Whirlpools and
    /// forks never react to contact.
    pub fn on_collision(&mut self, other: &ContactInfo) -> Option<CollisionEffect> {
        if !self.active {
            return None;
        }

        match (&mut self.kind, other.tag) {
            (EntityKind::Player(player), ContactTag::Obstacle { damage, .. }) => {
                let separation = self.position - other.position;
                let outcome = player.on_obstacle(damage, separation, &mut self.velocity);
                if outcome.landed() {
                    self.dirty = true;
                }
                Some(CollisionEffect::Damaged { amount: damage, outcome })
            }
            (EntityKind::Player(player), ContactTag::Collectible { collected: false, .. }) => {
                player.record_collectible();
                None
            }
            (EntityKind::Collectible(collectible), ContactTag::Player) => {
                if !collectible.collect() {
                    return None;
                }
                let effect = CollisionEffect::Collected {
                    collectible_type: collectible.collectible_type(),
                    value: collectible.value(),
                };
                self.active = false;
                Some(effect)
            }
            _ => None,
        }
    }

    /// Whether the entity has left the play area for good
    pub fn is_off_screen(&self, screen_height: f32) -> bool {
        let y = self.position.y;
        match &self.kind {
            EntityKind::Player(_) => false,
            EntityKind::Obstacle(_) | EntityKind::Collectible(_) => y > screen_height + OFF_SCREEN_MARGIN,
            EntityKind::Whirlpool(_) => y > screen_height + WHIRLPOOL_OFF_SCREEN_MARGIN,
            EntityKind::Fork(_) => y > screen_height + OFF_SCREEN_MARGIN || y < FORK_TOP_LIMIT,
        }
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        let kind = match &self.kind {
            EntityKind::Player(p) => SnapshotKind::Player {
                invincible: p.is_invincible(),
                damaged: p.is_recently_damaged(),
                speed_boosted: p.is_speed_boosted(),
            },
            EntityKind::Obstacle(o) => SnapshotKind::Obstacle {
                obstacle_type: o.obstacle_type(),
                radius: o.radius(),
            },
            EntityKind::Collectible(c) => SnapshotKind::Collectible {
                collectible_type: c.collectible_type(),
            },
            EntityKind::Whirlpool(w) => SnapshotKind::Whirlpool { radius: w.pull_radius },
            EntityKind::Fork(f) => SnapshotKind::Fork {
                choices: f.choices().len(),
                decided: f.is_decided(),
            },
        };
        EntitySnapshot {
            id: self.id.clone(),
            entity_type: self.entity_type(),
            kind,
            position: self.position,
            angle: self.angle,
            active: self.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_entity_types() {
        assert_eq!(Entity::player("p", Vec2::ZERO).entity_type(), EntityType::Player);
        assert_eq!(Entity::whirlpool("w", Vec2::ZERO).entity_type(), EntityType::Obstacle);
        assert_eq!(Entity::fork("f", Vec2::ZERO, vec![]).entity_type(), EntityType::Npc);
        assert_eq!(
            Entity::collectible("c", Vec2::ZERO, CollectibleType::Fish).entity_type(),
            EntityType::Collectible
        );
    }

    #[test]
    fn test_rock_collision_damages_player() {
        let mut player = Entity::player("player", Vec2::new(100.0, 100.0));
        let mut rock = Entity::obstacle("rock", Vec2::new(100.0, 60.0), Obstacle::new(ObstacleType::Rock));

        let p_info = player.contact_info();
        let r_info = rock.contact_info();
        let effect = player.on_collision(&r_info);
        assert!(rock.on_collision(&p_info).is_none());

        assert_eq!(
            effect,
            Some(CollisionEffect::Damaged { amount: 15.0, outcome: DamageOutcome::Hurt })
        );
        let p = player.as_player().unwrap();
        assert_relative_eq!(p.health(), 85.0);
        assert_eq!(p.lives(), 3);
        // Knocked downstream, away from the rock
        assert!(player.velocity().y > 0.0);
    }

    #[test]
    fn test_whirlpool_contact_is_harmless() {
        let mut player = Entity::player("player", Vec2::ZERO);
        let whirlpool = Entity::whirlpool("w", Vec2::ZERO);
        assert!(player.on_collision(&whirlpool.contact_info()).is_none());
        assert_relative_eq!(player.as_player().unwrap().health(), MAX_HEALTH);
    }

    #[test]
    fn test_collectible_pickup_once() {
        let mut player = Entity::player("player", Vec2::ZERO);
        let mut fish = Entity::collectible("fish", Vec2::ZERO, CollectibleType::Fish);

        let p_info = player.contact_info();
        let f_info = fish.contact_info();
        assert!(player.on_collision(&f_info).is_none());
        let effect = fish.on_collision(&p_info);
        assert_eq!(
            effect,
            Some(CollisionEffect::Collected { collectible_type: CollectibleType::Fish, value: 25.0 })
        );
        assert!(!fish.is_active());
        assert!(fish.as_collectible().unwrap().is_collected());
        assert_eq!(player.as_player().unwrap().collectibles_gathered(), 1);

        // Deactivated entities ignore further contact.
        assert!(fish.on_collision(&p_info).is_none());
    }

    #[test]
    fn test_obstacle_off_screen_is_monotonic() {
        let mut physics = PhysicsSystem::default();
        let mut log = Entity::obstacle("log", Vec2::new(0.0, 650.0), Obstacle::new(ObstacleType::Log));
        assert!(!log.is_off_screen(600.0));

        log.position.y = 701.0;
        assert!(log.is_off_screen(600.0));
        // Unbound entities keep drifting downstream, never back.
        for _ in 0..10 {
            log.update(16.0, &mut physics);
            log.position += log.velocity * 0.016;
            assert!(log.is_off_screen(600.0));
        }
    }

    #[test]
    fn test_fork_off_screen_top_and_bottom() {
        let mut fork = Entity::fork("f", Vec2::new(0.0, -250.0), vec![]);
        assert!(fork.is_off_screen(600.0));
        fork.position.y = 300.0;
        assert!(!fork.is_off_screen(600.0));
        fork.position.y = 701.0;
        assert!(fork.is_off_screen(600.0));
    }

    #[test]
    fn test_whirlpool_margin() {
        let mut w = Entity::whirlpool("w", Vec2::new(0.0, 720.0));
        assert!(!w.is_off_screen(600.0));
        w.position.y = 751.0;
        assert!(w.is_off_screen(600.0));
    }

    #[test]
    fn test_snapshot_kind() {
        let rock = Entity::obstacle("rock", Vec2::new(1.0, 2.0), Obstacle::new(ObstacleType::Rock));
        let snap = rock.snapshot();
        assert_eq!(snap.kind, SnapshotKind::Obstacle { obstacle_type: ObstacleType::Rock, radius: 30.0 });
        assert_eq!(snap.position, Vec2::new(1.0, 2.0));
        assert!(snap.active);
    }

    #[test]
    fn test_update_syncs_from_body() {
        use rio_physics::{BodyOptions, BodyShape};

        let mut physics = PhysicsSystem::default();
        let mut rock = Entity::obstacle("rock", Vec2::new(50.0, 50.0), Obstacle::new(ObstacleType::Rock));
        let handle = physics
            .create_body("rock", BodyShape::circle(30.0), rock.position(), BodyOptions::solid().with_velocity(Vec2::new(0.0, 120.0)))
            .unwrap();
        rock.attach_body(handle);

        physics.update(100.0);
        rock.update(100.0, &mut physics);
        assert!(rock.position().y > 50.0);
        assert!(physics.velocity("rock").unwrap().y > 0.0);
    }
}
