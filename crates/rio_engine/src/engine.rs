//! Fixed-rate simulation scheduler

use crate::command::{CommandSender, EngineCommand};
use crate::config::EngineConfig;
use crate::entity::Entity;
use crate::error::{EngineError, Result};
use crate::events::{
    CollisionReport, EngineEvent, EngineEventKind, Listeners, SubscriberId, TickReport,
};
use crate::manager::EntityManager;
use crate::timing::FrameClock;
use crossbeam_channel::{unbounded, Receiver, Sender};
use rio_physics::{BodyHandle, BodyOptions, BodyShape, PhysicsConfig, PhysicsSystem};
use serde::Serialize;
use std::collections::BTreeSet;

/// Scheduler status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineState {
    pub is_running: bool,
    pub is_paused: bool,
    pub target_fps: u32,
}

/// Owns physics and entities and advances them one tick at a time.
///
/// The host calls [`poll`](Self::poll) as often as it likes with a
/// monotonic clock; the engine decides when a tick is due.
pub struct GameEngine {
    config: EngineConfig,
    physics: PhysicsSystem,
    entities: EntityManager,
    clock: FrameClock,
    command_tx: Sender<EngineCommand>,
    command_rx: Receiver<EngineCommand>,
    listeners: Listeners,
    running: bool,
    paused: bool,
    tick_count: u64,
    /// Pairs touching at the end of the previous tick
    touching: BTreeSet<(String, String)>,
}

impl GameEngine {
    pub fn new(config: EngineConfig, physics_config: PhysicsConfig) -> Self {
        Self::with_physics(config, PhysicsSystem::new(physics_config))
    }

    pub fn with_physics(config: EngineConfig, physics: PhysicsSystem) -> Self {
        let (command_tx, command_rx) = unbounded();
        Self {
            clock: FrameClock::new(config.target_fps),
            config,
            physics,
            entities: EntityManager::new(),
            command_tx,
            command_rx,
            listeners: Listeners::default(),
            running: false,
            paused: false,
            tick_count: 0,
            touching: BTreeSet::new(),
        }
    }

    // ==================== Lifecycle ====================

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.paused = false;
        self.clock.reset();
        log::info!("Engine started at {} fps", self.config.target_fps);
    }

    /// Stop scheduling. Queued commands are discarded.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.paused = false;
        self.clock.reset();
        let dropped = self.command_rx.try_iter().count();
        if dropped > 0 {
            log::debug!("Discarded {} queued commands", dropped);
        }
        self.listeners.emit(&EngineEvent::Stopped);
        log::info!("Engine stopped after {} ticks", self.tick_count);
    }

    pub fn pause(&mut self) {
        if !self.running || self.paused {
            return;
        }
        self.paused = true;
        self.listeners.emit(&EngineEvent::Paused);
        log::debug!("Engine paused");
    }

    /// Resume from pause. Time spent paused is not simulated.
    pub fn resume(&mut self) {
        if !self.running || !self.paused {
            return;
        }
        self.paused = false;
        self.clock.reset();
        self.listeners.emit(&EngineEvent::Resumed);
        log::debug!("Engine resumed");
    }

    /// Stop and release every entity, body and subscriber
    pub fn destroy(&mut self) {
        self.stop();
        self.entities.clear(&mut self.physics);
        self.physics.clear();
        self.listeners.clear();
        self.touching.clear();
        log::info!("Engine destroyed");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            is_running: self.running,
            is_paused: self.paused,
            target_fps: self.config.target_fps,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Scheduling ====================

    /// Run a tick if one is due at `now_ms`.
    pub fn poll(&mut self, now_ms: f64) -> Option<TickReport> {
        if !self.running || self.paused {
            return None;
        }
        if !self.clock.advance(now_ms) {
            return None;
        }
        Some(self.tick(self.clock.interval_ms() as f32))
    }

    /// Run one fixed-interval tick immediately, if running and not paused.
    pub fn step(&mut self) -> Option<TickReport> {
        if !self.running || self.paused {
            return None;
        }
        Some(self.tick(self.clock.interval_ms() as f32))
    }

    fn tick(&mut self, delta_ms: f32) -> TickReport {
        self.tick_count += 1;

        // 1. Commands
        let mut removed = self.drain_commands();

        // 2. Physics, then entities
        self.physics.update(delta_ms);
        self.entities.update_all(delta_ms, &mut self.physics);

        // 3. Collisions
        let collisions = self.dispatch_collisions();
        self.entities.flush_all(&mut self.physics);

        // 4. Reap
        for id in self.entities.inactive_ids() {
            if self.remove_entity(&id).is_some() {
                removed.push(id);
            }
        }

        // 5. Tick
        self.listeners.emit(&EngineEvent::Tick {
            tick: self.tick_count,
            delta_ms,
        });

        TickReport {
            tick: self.tick_count,
            delta_ms,
            collisions,
            removed,
        }
    }

    /// Apply queued commands. Returns ids removed by `Despawn`.
    fn drain_commands(&mut self) -> Vec<String> {
        let mut despawned = Vec::new();
        for _ in 0..self.config.max_commands_per_tick {
            let Ok(command) = self.command_rx.try_recv() else {
                break;
            };
            if let Some(id) = self.apply_command(command) {
                despawned.push(id);
            }
        }
        self.entities.flush_all(&mut self.physics);
        despawned
    }

    fn apply_command(&mut self, command: EngineCommand) -> Option<String> {
        match command {
            EngineCommand::Steer { entity_id, thrust, turn } => {
                match self.entities.get_mut(&entity_id).and_then(Entity::as_player_mut) {
                    Some(player) => {
                        player.set_thrust(thrust);
                        player.set_turn(turn);
                    }
                    None => log::warn!("Steer: no player {}", entity_id),
                }
            }
            EngineCommand::ApplyForce { entity_id, force } => {
                if !self.physics.contains(&entity_id) {
                    log::warn!("ApplyForce: no body {}", entity_id);
                }
                self.physics.apply_force(&entity_id, force);
            }
            EngineCommand::SetVelocity { entity_id, velocity } => match self.entities.get_mut(&entity_id) {
                Some(entity) => entity.set_velocity(velocity),
                None => log::warn!("SetVelocity: no entity {}", entity_id),
            },
            EngineCommand::Despawn { entity_id } => {
                if self.remove_entity(&entity_id).is_some() {
                    return Some(entity_id);
                }
                log::warn!("Despawn: no entity {}", entity_id);
            }
        }
        None
    }

    /// Notify both sides of every contact that started this tick.
    fn dispatch_collisions(&mut self) -> Vec<CollisionReport> {
        let pairs = self.physics.check_collisions();
        let mut now_touching = BTreeSet::new();
        let mut reports = Vec::new();

        for pair in pairs {
            let key = (pair.a.clone(), pair.b.clone());
            let is_new = !self.touching.contains(&key);
            now_touching.insert(key);
            if !is_new {
                continue;
            }

            let info_a = self.entities.get(&pair.a).filter(|e| e.is_active()).map(Entity::contact_info);
            let info_b = self.entities.get(&pair.b).filter(|e| e.is_active()).map(Entity::contact_info);
            let (Some(info_a), Some(info_b)) = (info_a, info_b) else {
                continue;
            };

            let effect_a = self.entities.get_mut(&pair.a).and_then(|e| e.on_collision(&info_b));
            let effect_b = self.entities.get_mut(&pair.b).and_then(|e| e.on_collision(&info_a));

            let report = CollisionReport {
                a: pair.a,
                b: pair.b,
                sensor: pair.sensor,
                effect_a,
                effect_b,
            };
            self.listeners.emit(&EngineEvent::Collision(report.clone()));
            reports.push(report);
        }

        self.touching = now_touching;
        reports
    }

    // ==================== Commands ====================

    /// Queue a command for the next tick
    pub fn send_command(&self, command: EngineCommand) {
        // The receiver lives as long as the engine.
        let _ = self.command_tx.send(command);
    }

    /// Handle for queueing commands from elsewhere
    pub fn command_sender(&self) -> CommandSender {
        CommandSender(self.command_tx.clone())
    }

    pub fn pending_commands(&self) -> usize {
        self.command_rx.len()
    }

    // ==================== Entities ====================

    /// Create the entity's body and register both.
    pub fn spawn(&mut self, mut entity: Entity, shape: BodyShape, options: BodyOptions) -> Result<BodyHandle> {
        if self.entities.contains(entity.id()) {
            return Err(EngineError::DuplicateEntity(entity.id().to_string()));
        }
        let handle = self
            .physics
            .create_body(entity.id(), shape, entity.position(), options)?;
        entity.attach_body(handle);
        entity.sync_from_physics(&self.physics);
        self.entities.add(entity)?;
        Ok(handle)
    }

    /// Register an entity without a body
    pub fn add_entity(&mut self, entity: Entity) -> Result<()> {
        self.entities.add(entity)
    }

    /// Remove an entity and its body, notifying subscribers.
    pub fn remove_entity(&mut self, id: &str) -> Option<Entity> {
        let entity = self.entities.remove(id, &mut self.physics)?;
        self.touching.retain(|(a, b)| a != id && b != id);
        self.listeners.emit(&EngineEvent::EntityRemoved { id: id.to_string() });
        Some(entity)
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    pub fn physics(&self) -> &PhysicsSystem {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsSystem {
        &mut self.physics
    }

    /// Entity and physics together, for effects that touch both
    pub fn split_mut(&mut self) -> (&mut EntityManager, &mut PhysicsSystem) {
        (&mut self.entities, &mut self.physics)
    }

    // ==================== Subscribers ====================

    pub fn subscribe<F>(&mut self, kind: EngineEventKind, handler: F) -> SubscriberId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(kind, Box::new(handler))
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("state", &self.state())
            .field("tick_count", &self.tick_count)
            .field("entities", &self.entities.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}
