//! Physics system - owns the simulation world and the body arena

use crate::body::{BodyHandle, BodyOptions, BodyShape, BodyState};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use crate::events::CollisionPair;
use rapier2d::prelude as rapier;
use rio_math::Vec2;
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// A live body in the arena
#[derive(Debug)]
struct BodyEntry {
    id: String,
    rigid_body: rapier::RigidBodyHandle,
    collider: rapier::ColliderHandle,
}

#[derive(Debug, Default)]
struct BodySlot {
    generation: u32,
    entry: Option<BodyEntry>,
}

/// The rigid-body simulation for one game session
pub struct PhysicsSystem {
    /// Configuration
    config: PhysicsConfig,

    /// Rapier physics pipeline
    pipeline: rapier::PhysicsPipeline,

    /// Gravity
    gravity: rapier::Vector<f32>,

    /// Integration parameters
    integration_params: rapier::IntegrationParameters,

    /// Island manager
    islands: rapier::IslandManager,

    /// Broad phase
    broad_phase: rapier::DefaultBroadPhase,

    /// Narrow phase
    narrow_phase: rapier::NarrowPhase,

    /// Impulse joint set
    impulse_joints: rapier::ImpulseJointSet,

    /// Multibody joint set
    multibody_joints: rapier::MultibodyJointSet,

    /// CCD solver
    ccd_solver: rapier::CCDSolver,

    /// Rigid body set
    bodies: rapier::RigidBodySet,

    /// Collider set
    colliders: rapier::ColliderSet,

    /// Body arena
    slots: Vec<BodySlot>,

    /// Free arena slots
    free_slots: Vec<u32>,

    /// Owner id to arena handle
    by_id: HashMap<String, BodyHandle>,

    /// Collider to arena handle, for pair reporting
    by_collider: HashMap<rapier::ColliderHandle, BodyHandle>,

    /// Total simulated time in milliseconds
    elapsed_ms: f64,
}

impl PhysicsSystem {
    /// Create a new physics system
    pub fn new(config: PhysicsConfig) -> Self {
        let gravity = rapier::Vector::new(config.gravity[0], config.gravity[1]);

        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.dt = config.timestep;
        integration_params.num_solver_iterations =
            NonZeroUsize::new(config.solver_iterations).unwrap_or(NonZeroUsize::MIN);

        Self {
            config,
            pipeline: rapier::PhysicsPipeline::new(),
            gravity,
            integration_params,
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            by_id: HashMap::new(),
            by_collider: HashMap::new(),
            elapsed_ms: 0.0,
        }
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Total simulated time
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    // ==================== Bodies ====================

    /// Register the body owned by `id`.
    ///
    /// Each id owns at most one body; a second registration is rejected and
    /// leaves the existing body untouched.
    pub fn create_body(
        &mut self,
        id: impl Into<String>,
        shape: BodyShape,
        position: Vec2,
        options: BodyOptions,
    ) -> Result<BodyHandle> {
        let id = id.into();
        if self.by_id.contains_key(&id) {
            return Err(PhysicsError::BodyExists(id));
        }

        let collider = options.apply_to_collider(shape.to_rapier_builder()?, &self.config);
        let rigid_body = self.bodies.insert(options.to_rapier_body(position, &self.config));
        let collider = self
            .colliders
            .insert_with_parent(collider, rigid_body, &mut self.bodies);

        let handle = self.allocate_slot(BodyEntry {
            id: id.clone(),
            rigid_body,
            collider,
        });
        self.by_id.insert(id, handle);
        self.by_collider.insert(collider, handle);

        log::trace!("Created body {:?} (sensor: {})", handle, options.sensor);
        Ok(handle)
    }

    fn allocate_slot(&mut self, entry: BodyEntry) -> BodyHandle {
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry = Some(entry);
            BodyHandle { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(BodySlot { generation: 0, entry: Some(entry) });
            BodyHandle { index, generation: 0 }
        }
    }

    fn entry(&self, handle: BodyHandle) -> Option<&BodyEntry> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn rigid_body(&self, id: &str) -> Option<&rapier::RigidBody> {
        let handle = *self.by_id.get(id)?;
        let entry = self.entry(handle)?;
        self.bodies.get(entry.rigid_body)
    }

    fn rigid_body_mut(&mut self, id: &str) -> Option<&mut rapier::RigidBody> {
        let handle = *self.by_id.get(id)?;
        let rb = self.entry(handle)?.rigid_body;
        self.bodies.get_mut(rb)
    }

    /// Remove the body owned by `id`. Returns false for unknown ids.
    pub fn remove_body(&mut self, id: &str) -> bool {
        let Some(handle) = self.by_id.remove(id) else {
            return false;
        };
        let Some(entry) = self
            .slots
            .get_mut(handle.index as usize)
            .and_then(|slot| slot.entry.take())
        else {
            return false;
        };

        self.by_collider.remove(&entry.collider);
        self.bodies.remove(
            entry.rigid_body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true, // Remove attached colliders
        );
        self.free_slots.push(handle.index);
        true
    }

    /// Whether `id` owns a body
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Arena handle for `id`
    pub fn handle(&self, id: &str) -> Option<BodyHandle> {
        self.by_id.get(id).copied()
    }

    /// Read the authoritative state through an arena handle.
    /// Stale handles resolve to `None`.
    pub fn state(&self, handle: BodyHandle) -> Option<BodyState> {
        let entry = self.entry(handle)?;
        let body = self.bodies.get(entry.rigid_body)?;
        let t = body.translation();
        let v = body.linvel();
        Some(BodyState {
            position: Vec2::new(t.x, t.y),
            velocity: Vec2::new(v.x, v.y),
            angle: body.rotation().angle(),
        })
    }

    /// Whether the body behind `handle` is a sensor
    pub fn is_sensor(&self, handle: BodyHandle) -> bool {
        self.entry(handle)
            .and_then(|e| self.colliders.get(e.collider))
            .map(|c| c.is_sensor())
            .unwrap_or(false)
    }

    /// Accumulate a force for the next update
    pub fn apply_force(&mut self, id: &str, force: Vec2) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.add_force(rapier::Vector::new(force.x, force.y), true);
        }
    }

    /// Overwrite linear velocity
    pub fn set_velocity(&mut self, id: &str, velocity: Vec2) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_linvel(rapier::Vector::new(velocity.x, velocity.y), true);
        }
    }

    /// Teleport a body
    pub fn set_position(&mut self, id: &str, position: Vec2) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_translation(rapier::Vector::new(position.x, position.y), true);
        }
    }

    /// Set heading in radians
    pub fn set_angle(&mut self, id: &str, angle: f32) {
        if let Some(body) = self.rigid_body_mut(id) {
            body.set_rotation(rapier::Rotation::new(angle), true);
        }
    }

    /// Body position
    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.rigid_body(id).map(|b| {
            let t = b.translation();
            Vec2::new(t.x, t.y)
        })
    }

    /// Body velocity
    pub fn velocity(&self, id: &str) -> Option<Vec2> {
        self.rigid_body(id).map(|b| {
            let v = b.linvel();
            Vec2::new(v.x, v.y)
        })
    }

    /// Body heading
    pub fn angle(&self, id: &str) -> Option<f32> {
        self.rigid_body(id).map(|b| b.rotation().angle())
    }

    /// Ids of every registered body
    pub fn body_ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    // ==================== Simulation ====================

    /// Advance the simulation by `delta_ms` of wall-clock time.
    ///
    /// The interval is split into equal substeps no longer than the configured
    /// timestep (capped at `max_substeps`). Forces applied since the previous
    /// update act over the whole interval and are cleared afterwards.
    pub fn update(&mut self, delta_ms: f32) {
        if delta_ms.is_nan() || delta_ms <= 0.0 {
            return;
        }

        let total = delta_ms / 1000.0;
        let steps = ((total / self.config.timestep) - 1e-4)
            .ceil()
            .clamp(1.0, self.config.max_substeps as f32) as u32;
        self.integration_params.dt = total / steps as f32;

        for _ in 0..steps {
            self.pipeline.step(
                &self.gravity,
                &self.integration_params,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
        }

        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }

        self.elapsed_ms += delta_ms as f64;
    }

    /// Pairs of bodies touching right now: solid contacts and sensor
    /// intersections, sorted for deterministic dispatch.
    pub fn check_collisions(&self) -> Vec<CollisionPair> {
        let mut pairs = Vec::new();

        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            if let Some((a, b)) = self.pair_ids(pair.collider1, pair.collider2) {
                pairs.push(CollisionPair::new(a, b, false));
            }
        }

        for (h1, h2, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            if let Some((a, b)) = self.pair_ids(h1, h2) {
                pairs.push(CollisionPair::new(a, b, true));
            }
        }

        pairs.sort();
        pairs.dedup_by(|x, y| x.a == y.a && x.b == y.b);
        pairs
    }

    fn pair_ids(&self, h1: rapier::ColliderHandle, h2: rapier::ColliderHandle) -> Option<(&str, &str)> {
        let a = self.entry(*self.by_collider.get(&h1)?)?;
        let b = self.entry(*self.by_collider.get(&h2)?)?;
        Some((a.id.as_str(), b.id.as_str()))
    }

    /// Drop every body and start from an empty world
    pub fn clear(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config);
    }

    // ==================== Debug ====================

    /// Get number of bodies
    pub fn body_count(&self) -> usize {
        self.by_id.len()
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FRAME_MS: f32 = 1000.0 / 60.0;

    fn ball(physics: &mut PhysicsSystem, id: &str, x: f32, y: f32, options: BodyOptions) -> BodyHandle {
        physics
            .create_body(id, BodyShape::circle(10.0), Vec2::new(x, y), options)
            .unwrap()
    }

    #[test]
    fn test_create_world() {
        let physics = PhysicsSystem::new(PhysicsConfig::default());
        assert_eq!(physics.body_count(), 0);
        assert!(physics.check_collisions().is_empty());
    }

    #[test]
    fn test_one_body_per_id() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "log_1", 0.0, 0.0, BodyOptions::solid());

        let second = physics.create_body("log_1", BodyShape::circle(5.0), Vec2::ZERO, BodyOptions::solid());
        assert!(matches!(second, Err(PhysicsError::BodyExists(id)) if id == "log_1"));
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut physics = PhysicsSystem::default();
        physics.apply_force("ghost", Vec2::new(10.0, 0.0));
        physics.set_velocity("ghost", Vec2::new(10.0, 0.0));
        physics.set_position("ghost", Vec2::new(10.0, 0.0));
        physics.set_angle("ghost", 1.0);
        assert!(!physics.remove_body("ghost"));
        assert!(physics.position("ghost").is_none());
    }

    #[test]
    fn test_no_gravity() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "buoy", 100.0, 100.0, BodyOptions::solid());

        for _ in 0..60 {
            physics.update(FRAME_MS);
        }

        let pos = physics.position("buoy").unwrap();
        assert_relative_eq!(pos.x, 100.0, epsilon = 1e-3);
        assert_relative_eq!(pos.y, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_water_drag_slows_bodies() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "canoe", 0.0, 0.0, BodyOptions::solid());
        physics.set_velocity("canoe", Vec2::new(100.0, 0.0));

        for _ in 0..60 {
            physics.update(FRAME_MS);
        }

        let v = physics.velocity("canoe").unwrap();
        assert!(v.x > 0.0 && v.x < 100.0, "drag should slow without stopping: {}", v.x);
        assert!(physics.position("canoe").unwrap().x > 0.0);
    }

    #[test]
    fn test_forces_last_one_update() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "canoe", 0.0, 0.0, BodyOptions::solid());

        physics.apply_force("canoe", Vec2::new(600.0, 0.0));
        physics.update(FRAME_MS);
        let pushed = physics.velocity("canoe").unwrap().x;
        assert!(pushed > 0.0);

        physics.update(FRAME_MS);
        let coasting = physics.velocity("canoe").unwrap().x;
        assert!(coasting < pushed, "force must not persist past its update");
    }

    #[test]
    fn test_solid_contact_reported() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "player", 0.0, 0.0, BodyOptions::solid());
        ball(&mut physics, "rock", 15.0, 0.0, BodyOptions::solid());

        physics.update(FRAME_MS);

        let pairs = physics.check_collisions();
        assert_eq!(pairs, vec![CollisionPair::new("player", "rock", false)]);
    }

    #[test]
    fn test_sensor_detects_without_response() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "player", 0.0, 0.0, BodyOptions::solid());
        ball(&mut physics, "fish", 5.0, 0.0, BodyOptions::sensor());

        physics.update(FRAME_MS);

        let pairs = physics.check_collisions();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].sensor);
        assert!(pairs[0].involves("fish"));

        let v = physics.velocity("player").unwrap();
        assert_relative_eq!(v.length(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_separated_bodies_do_not_touch() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "a", 0.0, 0.0, BodyOptions::solid());
        ball(&mut physics, "b", 200.0, 0.0, BodyOptions::sensor());
        physics.update(FRAME_MS);
        assert!(physics.check_collisions().is_empty());
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut physics = PhysicsSystem::default();
        let old = ball(&mut physics, "log_1", 0.0, 0.0, BodyOptions::solid());
        assert!(physics.remove_body("log_1"));
        assert!(physics.state(old).is_none());

        let new = ball(&mut physics, "log_2", 50.0, 0.0, BodyOptions::solid());
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(physics.state(old).is_none());
        assert_relative_eq!(physics.state(new).unwrap().position.x, 50.0);
    }

    #[test]
    fn test_angle_round_trip() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "whirl", 0.0, 0.0, BodyOptions::sensor());
        physics.set_angle("whirl", 0.75);
        assert_relative_eq!(physics.angle("whirl").unwrap(), 0.75, epsilon = 1e-5);
    }

    #[test]
    fn test_clear() {
        let mut physics = PhysicsSystem::default();
        ball(&mut physics, "a", 0.0, 0.0, BodyOptions::solid());
        physics.clear();
        assert_eq!(physics.body_count(), 0);
        assert!(!physics.contains("a"));
    }
}
