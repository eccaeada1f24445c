//! The game coordinator
//!
//! [`Game`] owns every subsystem of a run and reacts to each engine tick in a
//! fixed order:
//!
//! 1. advance game time
//! 2. apply collision outcomes (hits, pickups)
//! 3. whirlpool pull and damage
//! 4. player thrust and turn
//! 5. river current
//! 6. navigation progress, fork markers, dwelling at nodes
//! 7. encounter triggers
//! 8. HUD text
//! 9. entity snapshots to the renderer
//! 10. off-screen reaping and avoidance points
//! 11. spawns
//! 12. game over
//!
//! Overlays (dialogue, trade) pause the engine; nothing advances until
//! [`Game::close_overlay`] is called.

use crate::config::GameConfig;
use crate::content::GameContent;
use crate::dialogue::{DialogueChoice, DialogueEffect, DialogueLibrary, DialogueNode};
use crate::error::{GameError, Result};
use crate::services::{Overlay, Services, TextLabel, Viewport};
use crate::spawner::{SpawnRequest, Spawner};
use crate::state::{ScreenState, StateManager};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use rio_engine::{
    CollectibleType, CollisionEffect, CommandSender, DamageOutcome, EngineCommand, Entity,
    EntityKind, GameEngine, Player, PlayerStats, TickReport,
};
use rio_events::{DiscoveryType, EventContext, EventManager, EventPayload, EventResult, GameEvent};
use rio_math::Vec2;
use rio_navigation::{ForkChoice, NavigationError, NavigationManager};
use rio_physics::{BodyOptions, BodyShape};
use rio_progress::{ObjectiveKind, QuestCompletion, QuestManager, RewardKind, SpecimenManager};

/// Entity id of the canoe
pub const PLAYER_ID: &str = "player";

/// How long a hazard's speed modifier lasts (ms)
const HAZARD_SLOWDOWN_MS: f32 = 10_000.0;

/// Points for letting an obstacle pass, before the combo bonus
const AVOID_POINTS: f32 = 10.0;

/// Where an open dialogue is
#[derive(Debug, Clone, PartialEq)]
struct DialogueCursor {
    tree_id: String,
    node_id: String,
}

/// One river run
pub struct Game {
    config: GameConfig,
    services: Services,
    viewport: Viewport,

    engine: GameEngine,
    navigation: NavigationManager,
    events: EventManager,
    quests: QuestManager,
    specimens: SpecimenManager,
    dialogues: DialogueLibrary,
    state: StateManager,
    spawner: Spawner,
    rng: StdRng,

    started: bool,
    game_over: bool,
    journey_complete: bool,
    score: u64,
    game_time_ms: f64,
    event_timer_ms: f64,
    dwell_remaining_ms: f32,
    current_fork: Option<String>,
    /// Entity the player last collided with, consumed by the next trigger check
    collision_entity: Option<String>,
    dialogue: Option<DialogueCursor>,
}

impl Game {
    pub fn new(config: GameConfig, content: GameContent, services: Services) -> Result<Self> {
        content.validate()?;
        let GameContent {
            map,
            events,
            quests,
            specimens,
            guidebook,
            dialogues,
        } = content;

        let navigation = NavigationManager::new(map, &config.navigation.start_node)?
            .with_fork_lookahead(config.navigation.fork_lookahead);

        let mut event_manager = EventManager::new();
        let registered = event_manager.register_events(events);

        let mut quest_manager = QuestManager::new();
        quest_manager.register_quests(quests);

        let mut specimen_manager = SpecimenManager::new();
        specimen_manager.register_specimens(specimens);
        specimen_manager.register_entries(guidebook);

        let mut library = DialogueLibrary::new();
        library.register_all(dialogues);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::info!(
            "Game created: {} events, {} dialogues, start at {}",
            registered,
            library.len(),
            config.navigation.start_node
        );

        Ok(Self {
            engine: GameEngine::new(config.engine.clone(), config.physics.clone()),
            spawner: Spawner::new(config.spawn.clone(), &config.gameplay),
            viewport: Viewport::new(config.viewport.width, config.viewport.height),
            navigation,
            events: event_manager,
            quests: quest_manager,
            specimens: specimen_manager,
            dialogues: library,
            state: StateManager::new(),
            rng,
            config,
            services,
            started: false,
            game_over: false,
            journey_complete: false,
            score: 0,
            game_time_ms: 0.0,
            event_timer_ms: 0.0,
            dwell_remaining_ms: 0.0,
            current_fork: None,
            collision_entity: None,
            dialogue: None,
        })
    }

    // ==================== Lifecycle ====================

    /// Put the canoe on the water and start the engine.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            log::warn!("Game already started");
            return Ok(());
        }

        let viewport = self.services.renderer.viewport();
        if viewport.is_valid() {
            self.viewport = viewport;
        } else {
            log::warn!("Renderer reported an empty viewport, using {:?}", self.viewport);
        }

        // Resolve the opening leg first so a bad target leaves nothing spawned.
        let first_target = self.config.navigation.first_target.clone();
        if let Some(target) = &first_target {
            self.navigation.set_target(target)?;
        }
        self.spawn_player()?;
        if first_target.is_none() {
            self.depart();
        }

        let width = self.viewport.width;
        let opening = self.spawner.obstacle(width, 0.0, &mut self.rng);
        self.spawn(opening);

        self.engine.start();
        self.state.set_state(ScreenState::River);
        let volume = self.config.audio.effective_music_volume();
        self.services.audio.play_music("river_theme", volume);
        self.started = true;

        log::info!("Game started, heading for {:?}", self.navigation.state().target_node_id);
        Ok(())
    }

    fn spawn_player(&mut self) -> Result<()> {
        let cfg = &self.config.player;
        let mut player = Player::new().with_lives(cfg.lives);
        player.max_speed = cfg.max_speed;
        player.acceleration = cfg.acceleration;
        player.turn_rate = cfg.turn_rate;

        let position = Vec2::new(self.viewport.width * 0.5, self.viewport.height - cfg.spawn_offset);
        let entity = Entity::new(PLAYER_ID, position, EntityKind::Player(Box::new(player)));
        let shape = BodyShape::rect(cfg.width, cfg.height);
        let options = BodyOptions::solid()
            .with_fixed_rotation()
            .with_linear_damping(cfg.linear_damping);

        self.engine.spawn(entity, shape, options)?;
        Ok(())
    }

    /// Run a tick if one is due at `now_ms` and react to it.
    pub fn poll(&mut self, now_ms: f64) -> Option<TickReport> {
        let report = self.engine.poll(now_ms)?;
        self.on_tick(&report);
        Some(report)
    }

    /// Run one tick immediately and react to it.
    pub fn step(&mut self) -> Option<TickReport> {
        let report = self.engine.step()?;
        self.on_tick(&report);
        Some(report)
    }

    pub fn pause(&mut self) {
        if !self.started || self.is_over() || self.state.current().is_overlay() {
            return;
        }
        self.engine.pause();
        self.state.set_state(ScreenState::Paused);
    }

    /// Resume from a pause. Overlays are left with [`close_overlay`](Self::close_overlay).
    pub fn resume(&mut self) {
        if !self.state.is_in(ScreenState::Paused) {
            return;
        }
        self.state.go_back();
        self.engine.resume();
    }

    /// Close the open dialogue or trade overlay and resume play.
    pub fn close_overlay(&mut self) -> bool {
        if !self.state.current().is_overlay() {
            return false;
        }
        self.dialogue = None;
        self.services.overlay.close_overlay();
        self.state.go_back();
        self.engine.resume();
        log::debug!("Overlay closed");
        true
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.services.audio.stop_music();
    }

    /// Stop and release every entity and body.
    pub fn destroy(&mut self) {
        self.stop();
        self.engine.destroy();
        self.current_fork = None;
        self.dialogue = None;
        self.state.reset();
        self.started = false;
        log::info!("Game destroyed");
    }

    // ==================== Input ====================

    /// Queue steering intents for the next tick, each in `[-1, 1]`.
    pub fn steer(&self, thrust: f32, turn: f32) {
        self.engine.send_command(EngineCommand::Steer {
            entity_id: PLAYER_ID.to_string(),
            thrust,
            turn,
        });
    }

    /// Handle for steering from another thread
    pub fn command_sender(&self) -> CommandSender {
        self.engine.command_sender()
    }

    /// Take branch `index` of the fork marker on screen.
    pub fn choose_fork(&mut self, index: usize) -> bool {
        let Some(fork_id) = self.current_fork.clone() else {
            log::warn!("No fork to choose from");
            return false;
        };
        let Some(fork) = self.engine.entity_mut(&fork_id).and_then(Entity::as_fork_mut) else {
            return false;
        };
        let Some(segment_id) = fork.choices().get(index).map(|c| c.segment_id.clone()) else {
            log::warn!("Fork has no choice {}", index);
            return false;
        };
        let Some(choice) = fork.select(&segment_id).cloned() else {
            log::debug!("Fork already decided");
            return false;
        };

        self.notice(&format!("Heading {}", choice.description));
        self.resolve_fork(&choice);
        true
    }

    // ==================== Dialogue ====================

    /// Node of the open dialogue
    pub fn dialogue_node(&self) -> Option<&DialogueNode> {
        let cursor = self.dialogue.as_ref()?;
        self.dialogues.node(&cursor.tree_id, &cursor.node_id)
    }

    /// Choices on the open node whose flag condition holds
    pub fn dialogue_choices(&self) -> Vec<&DialogueChoice> {
        self.dialogue_node()
            .map(|node| self.available_choices(node))
            .unwrap_or_default()
    }

    fn available_choices<'a>(&self, node: &'a DialogueNode) -> Vec<&'a DialogueChoice> {
        node.choices
            .iter()
            .filter(|c| c.condition.as_deref().map_or(true, |flag| self.events.flag(flag)))
            .collect()
    }

    /// Move the open dialogue on. Nodes with choices need `choice`, an
    /// index into [`dialogue_choices`](Self::dialogue_choices). Reaching the
    /// end closes the overlay.
    pub fn advance_dialogue(&mut self, choice: Option<usize>) -> bool {
        let Some(cursor) = self.dialogue.clone() else {
            return false;
        };
        let Some(node) = self.dialogues.node(&cursor.tree_id, &cursor.node_id).cloned() else {
            log::warn!("Dialogue node missing: {}/{}", cursor.tree_id, cursor.node_id);
            self.close_overlay();
            return false;
        };

        let next = if node.choices.is_empty() {
            node.next_node_id.clone()
        } else {
            let Some(index) = choice else {
                return false;
            };
            let Some(picked) = self.available_choices(&node).get(index).map(|c| (*c).clone()) else {
                log::warn!("Dialogue {} has no choice {}", cursor.tree_id, index);
                return false;
            };
            if let Some(effect) = &picked.effect {
                self.apply_dialogue_effect(effect);
            }
            picked.next_node_id
        };

        let Some(next_id) = next else {
            self.close_overlay();
            return true;
        };
        let Some(effect) = self
            .dialogues
            .node(&cursor.tree_id, &next_id)
            .map(|n| n.effect.clone())
        else {
            log::warn!("Dialogue {} links to missing node {}", cursor.tree_id, next_id);
            self.close_overlay();
            return true;
        };

        self.dialogue = Some(DialogueCursor {
            tree_id: cursor.tree_id,
            node_id: next_id,
        });
        if let Some(effect) = effect {
            self.apply_dialogue_effect(&effect);
        }
        true
    }

    pub fn apply_dialogue_effect(&mut self, effect: &DialogueEffect) {
        match effect {
            DialogueEffect::AddItem { item, quantity } => {
                if let Some(player) = self.player_mut() {
                    player.inventory_mut().add(item.clone(), *quantity);
                }
                self.record_progress(ObjectiveKind::Collect, item, *quantity);
            }
            DialogueEffect::RemoveItem { item, quantity } => {
                if let Some(player) = self.player_mut() {
                    if !player.inventory_mut().remove(item, *quantity) {
                        log::warn!("Not enough {} to remove {}", item, quantity);
                    }
                }
            }
            DialogueEffect::ChangeHealth { amount } => {
                if let Some(player) = self.player_mut() {
                    if *amount >= 0.0 {
                        player.heal(*amount);
                    } else {
                        player.take_damage(-*amount);
                    }
                }
            }
            DialogueEffect::ChangeRations { amount } => {
                if let Some(player) = self.player_mut() {
                    if *amount >= 0.0 {
                        player.add_rations(*amount);
                    } else {
                        player.consume_rations(-*amount);
                    }
                }
            }
            DialogueEffect::UnlockLocation { node_id } => {
                if self.navigation.node(node_id).is_none() {
                    log::warn!("Unlock of unknown node {}", node_id);
                    return;
                }
                self.events.set_flag(format!("unlocked_{}", node_id), true);
            }
        }
    }

    fn open_dialogue(&mut self, dialogue_id: &str) -> bool {
        if self.state.current().is_overlay() {
            log::debug!("Overlay already open, skipping dialogue {}", dialogue_id);
            return false;
        }
        let Some(start) = self.dialogues.start_node(dialogue_id) else {
            log::warn!("Dialogue not found: {}", dialogue_id);
            return false;
        };
        let speaker = start.speaker.clone();
        let node_id = start.id.clone();
        let effect = start.effect.clone();

        self.services.overlay.open_overlay(&Overlay::Dialogue {
            dialogue_id: dialogue_id.to_string(),
            speaker: Some(speaker),
        });
        self.show_overlay(ScreenState::Dialogue);
        self.dialogue = Some(DialogueCursor {
            tree_id: dialogue_id.to_string(),
            node_id,
        });
        if let Some(effect) = effect {
            self.apply_dialogue_effect(&effect);
        }
        self.record_progress(ObjectiveKind::Talk, dialogue_id, 1);
        true
    }

    fn open_trade(&mut self, merchant_id: &str, dialogue_id: Option<&str>) -> bool {
        if self.state.current().is_overlay() {
            log::debug!("Overlay already open, skipping trade with {}", merchant_id);
            return false;
        }
        let dialogue_id = dialogue_id.filter(|id| {
            let known = self.dialogues.contains(id);
            if !known {
                log::warn!("Dialogue not found: {}", id);
            }
            known
        });

        self.services.overlay.open_overlay(&Overlay::Trade {
            merchant_id: merchant_id.to_string(),
            dialogue_id: dialogue_id.map(str::to_string),
        });
        self.show_overlay(ScreenState::Trade);
        if let Some(id) = dialogue_id {
            if let Some(start) = self.dialogues.start_node(id) {
                self.dialogue = Some(DialogueCursor {
                    tree_id: id.to_string(),
                    node_id: start.id.clone(),
                });
            }
            self.record_progress(ObjectiveKind::Talk, id, 1);
        }
        self.record_progress(ObjectiveKind::Talk, merchant_id, 1);
        true
    }

    fn show_overlay(&mut self, screen: ScreenState) {
        self.engine.pause();
        self.state.set_state(screen);
        let volume = self.config.audio.effective_sfx_volume();
        self.services.audio.play_sfx("overlay_open", volume);
    }

    // ==================== Tick ====================

    fn on_tick(&mut self, report: &TickReport) {
        let delta_ms = report.delta_ms;
        self.game_time_ms += delta_ms as f64;

        self.handle_collisions(report);
        if self.engine.entity(PLAYER_ID).is_none() {
            self.end_game();
            return;
        }

        self.apply_whirlpools();
        self.apply_controls(delta_ms);
        self.apply_current();
        self.update_navigation(delta_ms);
        self.check_events(delta_ms as f64);
        self.update_hud();
        self.draw(report);
        self.reap_off_screen();
        self.spawn_due(delta_ms);

        if self.player().map_or(true, |p| !p.is_alive()) {
            self.end_game();
        }
    }

    fn handle_collisions(&mut self, report: &TickReport) {
        let volume = self.config.audio.effective_sfx_volume();
        for collision in &report.collisions {
            for (id, effect) in collision.effects() {
                match effect {
                    CollisionEffect::Damaged { amount, outcome } => {
                        if !outcome.landed() {
                            continue;
                        }
                        log::debug!("{} hit for {:.1} ({:?})", id, amount, outcome);
                        self.collision_entity = collision.other(id).map(str::to_string);
                        let sfx = match outcome {
                            DamageOutcome::LifeLost => "life_lost",
                            _ => "hit",
                        };
                        self.services.audio.play_sfx(sfx, volume);
                    }
                    CollisionEffect::Collected { collectible_type, value } => {
                        self.collision_entity = collision.other(id).map(str::to_string);
                        self.on_pickup(collectible_type, value);
                    }
                }
            }
        }
    }

    fn on_pickup(&mut self, collectible_type: CollectibleType, value: f32) {
        let volume = self.config.audio.effective_sfx_volume();
        self.services.audio.play_sfx("pickup", volume);

        match collectible_type {
            CollectibleType::Fish => self.score += value as u64,
            CollectibleType::HealthPack => {
                if let Some(player) = self.player_mut() {
                    player.heal(value);
                }
            }
            CollectibleType::SpeedBoost => {
                if let Some(player) = self.player_mut() {
                    player.apply_speed_boost(value * 1000.0);
                }
            }
            CollectibleType::Specimen => {
                self.score += value as u64;
                let picked = self
                    .specimens
                    .specimens()
                    .map(|s| s.id.clone())
                    .choose(&mut self.rng);
                match picked {
                    Some(id) => self.collect_specimen(&id),
                    None => log::warn!("No specimens registered"),
                }
            }
        }
        log::debug!("Collected {:?}, value {}", collectible_type, value);
    }

    fn apply_whirlpools(&mut self) {
        let Some(target) = self.engine.entity(PLAYER_ID).map(Entity::position) else {
            return;
        };

        let mut pull = Vec2::ZERO;
        let mut damage = 0.0;
        for entity in self.engine.entities_mut().all_mut() {
            if !entity.is_active() {
                continue;
            }
            let center = entity.position();
            let Some(whirlpool) = entity.as_whirlpool_mut() else {
                continue;
            };
            if let Some(force) = whirlpool.pull_force(center, target) {
                pull += force;
                damage += whirlpool.try_damage_tick().unwrap_or(0.0);
            }
        }

        if !pull.is_zero() {
            self.engine.physics_mut().apply_force(PLAYER_ID, pull);
        }
        if damage > 0.0 {
            if let Some(player) = self.player_mut() {
                player.take_damage(damage);
            }
        }
    }

    fn apply_controls(&mut self, delta_ms: f32) {
        let sensitivity = self.config.gameplay.steering_sensitivity;
        let Some(entity) = self.engine.entity(PLAYER_ID) else {
            return;
        };
        let angle = entity.angle();
        let Some(player) = entity.as_player() else {
            return;
        };
        let thrust = player.thrust_force(angle);
        let turn = player.turn_amount(delta_ms, sensitivity);

        let physics = self.engine.physics_mut();
        if !thrust.is_zero() {
            physics.apply_force(PLAYER_ID, thrust);
        }
        if turn != 0.0 {
            physics.set_angle(PLAYER_ID, angle + turn);
        }
    }

    fn apply_current(&mut self) {
        let flow = self.navigation.current_flow();
        if !flow.is_zero() {
            let force = flow * self.config.navigation.flow_force_scale;
            self.engine.physics_mut().apply_force(PLAYER_ID, force);
        }
    }

    // ==================== Navigation ====================

    fn update_navigation(&mut self, delta_ms: f32) {
        let cfg = &self.config.navigation;
        let speed = self.engine.entity(PLAYER_ID).map_or(0.0, |e| e.velocity().length());

        if self.navigation.is_traveling() {
            let distance = (speed + cfg.cruise_speed) * (delta_ms / 1000.0) * cfg.distance_scale;
            let update = self.navigation.update(distance);
            if let Some(player) = self.player_mut() {
                player.add_distance(distance);
            }
            if update.fork_published {
                self.spawn_fork();
            }
            if let Some(node_id) = update.arrived_at {
                self.on_arrival(&node_id);
            }
        } else if !self.journey_complete && self.current_fork.is_none() {
            self.dwell_remaining_ms -= delta_ms;
            if self.dwell_remaining_ms <= 0.0 {
                self.depart();
            }
        }

        self.update_fork();
    }

    fn on_arrival(&mut self, node_id: &str) {
        let name = self
            .navigation
            .node(node_id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| node_id.to_string());
        self.notice(&format!("Arrived at {}", name));
        let volume = self.config.audio.effective_sfx_volume();
        self.services.audio.play_sfx("arrival", volume);

        self.dwell_remaining_ms = self.config.navigation.dwell_ms;
        self.record_progress(ObjectiveKind::Reach, node_id, 1);
    }

    fn depart(&mut self) {
        match self.navigation.depart() {
            Ok(target) => log::info!("Departing for {}", target),
            Err(NavigationError::ForkUndecided(node)) => {
                log::debug!("Waiting for a fork choice at {}", node);
                self.spawn_fork();
            }
            Err(NavigationError::EndOfRiver(node)) => self.finish_journey(&node),
            Err(e) => log::warn!("Cannot depart: {}", e),
        }
    }

    fn finish_journey(&mut self, node_id: &str) {
        if self.journey_complete {
            return;
        }
        self.journey_complete = true;
        self.engine.stop();
        self.services.audio.stop_music();
        let volume = self.config.audio.effective_sfx_volume();
        self.services.audio.play_sfx("journey_complete", volume);
        self.notice(&format!("Journey complete at {}! Final score: {}", node_id, self.score));
        log::info!("Journey complete at {}, score {}", node_id, self.score);
    }

    fn spawn_fork(&mut self) {
        if self.current_fork.is_some() {
            return;
        }
        let Some(choices) = self.navigation.upcoming_fork().map(<[ForkChoice]>::to_vec) else {
            return;
        };
        let options: Vec<&str> = choices.iter().map(|c| c.description.as_str()).collect();
        let message = format!("Fork ahead: {}", options.join(" | "));

        let request = self.spawner.fork(self.viewport.width, choices);
        let id = request.id().to_string();
        if self.spawn(request) {
            self.current_fork = Some(id);
            self.notice(&message);
        }
    }

    /// Remove the fork marker once it has scrolled far enough, taking the
    /// first branch if the player never chose.
    fn update_fork(&mut self) {
        let Some(fork_id) = self.current_fork.clone() else {
            return;
        };
        let resolve_distance = self.config.navigation.fork_resolve_distance;
        let height = self.viewport.height;

        let Some(entity) = self.engine.entity_mut(&fork_id) else {
            self.current_fork = None;
            return;
        };
        let off_screen = entity.is_off_screen(height);
        let Some(fork) = entity.as_fork_mut() else {
            self.current_fork = None;
            return;
        };
        if fork.travelled() < resolve_distance && !off_screen {
            return;
        }

        let auto = if fork.is_decided() {
            None
        } else {
            fork.auto_select().cloned()
        };
        if let Some(choice) = auto {
            self.notice(&format!("The current carries you {}", choice.description));
            self.resolve_fork(&choice);
        }

        self.engine.remove_entity(&fork_id);
        self.services.renderer.remove_entity(&fork_id);
        self.current_fork = None;
    }

    fn resolve_fork(&mut self, choice: &ForkChoice) {
        match self.navigation.choose_fork(&choice.segment_id) {
            Ok(()) => {}
            // The fork list is dropped on arrival; at the node the branch can be taken directly.
            Err(NavigationError::NoPendingFork) if !self.navigation.is_traveling() => {
                if let Err(e) = self.navigation.set_target(&choice.to_node_id) {
                    log::warn!("Cannot take {}: {}", choice.description, e);
                }
            }
            Err(e) => log::warn!("Cannot take {}: {}", choice.description, e),
        }
    }

    // ==================== Events ====================

    fn event_context(&mut self) -> EventContext {
        let mut context = EventContext {
            current_location: Some(self.navigation.state().current_node_id.clone()),
            game_time_ms: self.game_time_ms,
            collision_entity: self.collision_entity.take(),
            ..Default::default()
        };
        if let Some(player) = self.player() {
            context.distance_traveled = player.distance();
            context.health = player.health();
            context.rations = player.rations();
            context.inventory = player
                .inventory()
                .iter()
                .map(|(id, count)| (id.to_string(), count))
                .collect();
        }
        context
    }

    fn check_events(&mut self, delta_ms: f64) {
        self.event_timer_ms += delta_ms;
        if self.event_timer_ms < self.config.gameplay.event_check_interval_ms {
            return;
        }
        self.event_timer_ms = 0.0;

        let context = self.event_context();
        let fired: Vec<GameEvent> = self
            .events
            .check_triggers(&context, &mut self.rng)
            .into_iter()
            .cloned()
            .collect();

        for event in fired {
            if !self.can_dispatch(&event) {
                log::debug!("Holding event {} for a later check", event.id);
                continue;
            }
            if let Err(e) = self.events.trigger_event(&event.id, self.game_time_ms) {
                log::warn!("Could not trigger {}: {}", event.id, e);
                continue;
            }
            let message = self.dispatch_event(&event);
            self.events
                .complete_event(&event.id, Some(EventResult::success(message)));
        }
    }

    /// Events that need a free overlay, or a dialogue that exists, stay
    /// eligible until they can actually be shown.
    fn can_dispatch(&self, event: &GameEvent) -> bool {
        match &event.payload {
            EventPayload::Dialogue { dialogue_id } => {
                !self.state.current().is_overlay() && self.dialogues.contains(dialogue_id)
            }
            EventPayload::Trade { .. } => !self.state.current().is_overlay(),
            _ => true,
        }
    }

    /// Turn a fired event into gameplay. Returns a summary for the event log.
    fn dispatch_event(&mut self, event: &GameEvent) -> String {
        log::info!("Dispatching {:?} event {}", event.event_type(), event.id);

        match &event.payload {
            EventPayload::Dialogue { dialogue_id } => {
                self.open_dialogue(dialogue_id);
                format!("dialogue {}", dialogue_id)
            }
            EventPayload::Trade {
                merchant_id,
                dialogue_id,
            } => {
                self.open_trade(merchant_id, dialogue_id.as_deref());
                format!("trade with {}", merchant_id)
            }
            EventPayload::Discovery {
                discovery_type,
                discovery_id,
            } => {
                match discovery_type {
                    DiscoveryType::Specimen => self.collect_specimen(discovery_id),
                    DiscoveryType::Item => {
                        if let Some(player) = self.player_mut() {
                            player.inventory_mut().add(discovery_id.clone(), 1);
                        }
                        self.notice(&format!("Found {}", discovery_id));
                        self.record_progress(ObjectiveKind::Collect, discovery_id, 1);
                    }
                    DiscoveryType::Location | DiscoveryType::Npc => {
                        self.notice(&format!("Discovered {}", event.name));
                        self.record_progress(ObjectiveKind::Discover, discovery_id, 1);
                    }
                }
                format!("discovered {}", discovery_id)
            }
            EventPayload::Quest { quest_id, dialogue_id } => {
                match self.quests.start_quest(quest_id) {
                    Ok(()) => {
                        let name = self
                            .quests
                            .quest(quest_id)
                            .map(|q| q.name.clone())
                            .unwrap_or_else(|| quest_id.clone());
                        self.notice(&format!("Quest started: {}", name));
                    }
                    Err(e) => log::warn!("Quest {} not started: {}", quest_id, e),
                }
                if let Some(dialogue_id) = dialogue_id {
                    self.open_dialogue(dialogue_id);
                }
                format!("quest {}", quest_id)
            }
            EventPayload::Hazard {
                hazard_type,
                damage,
                rations_lost,
                speed_modifier,
                discovery_id,
            } => {
                let alive = match self.player_mut() {
                    Some(player) => {
                        player.take_damage(*damage);
                        player.consume_rations(*rations_lost);
                        if let Some(factor) = speed_modifier {
                            player.apply_speed_modifier(*factor, HAZARD_SLOWDOWN_MS);
                        }
                        player.is_alive()
                    }
                    None => false,
                };
                self.notice(&event.name);
                let volume = self.config.audio.effective_sfx_volume();
                self.services.audio.play_sfx(hazard_type.as_str(), volume);

                if let Some(id) = discovery_id {
                    self.collect_specimen(id);
                }
                if alive {
                    self.record_progress(ObjectiveKind::Survive, hazard_type.as_str(), 1);
                }
                format!("{} for {:.0}", hazard_type.as_str(), damage)
            }
            EventPayload::Encounter {
                hostile,
                damage,
                dialogue_id,
            } => {
                if *hostile {
                    if let Some(player) = self.player_mut() {
                        player.take_damage(*damage);
                    }
                }
                if let Some(dialogue_id) = dialogue_id {
                    self.open_dialogue(dialogue_id);
                }
                if *hostile {
                    "hostile encounter".to_string()
                } else {
                    "friendly encounter".to_string()
                }
            }
            EventPayload::Environmental {
                speed_modifier,
                duration_ms,
                weather_effect,
            } => {
                if let Some(player) = self.player_mut() {
                    player.apply_speed_modifier(*speed_modifier, *duration_ms);
                }
                let weather = weather_effect.as_deref().unwrap_or("weather");
                self.notice(&format!("{}: speed x{:.1}", event.name, speed_modifier));
                format!("{} for {:.0} ms", weather, duration_ms)
            }
        }
    }

    // ==================== Progress ====================

    /// A specimen sample: counts toward collect objectives every time,
    /// toward discover objectives the first time.
    fn collect_specimen(&mut self, specimen_id: &str) {
        let location = self.navigation.current_node().map(|n| n.name.clone());
        let Some(discovery) = self
            .specimens
            .discover_specimen(specimen_id, location.as_deref())
        else {
            return;
        };

        if discovery.newly_discovered {
            let specimen = &discovery.specimen;
            self.notice(&format!("New specimen: {}", specimen.name));
            let volume = self.config.audio.effective_sfx_volume();
            self.services.audio.play_sfx("discovery", volume);
            for entry in &discovery.unlocked_entries {
                log::info!("Guidebook entry unlocked: {}", entry);
            }

            let any = format!("any_{}", specimen.category.as_str());
            self.record_progress(ObjectiveKind::Discover, &specimen.id, 1);
            self.record_progress(ObjectiveKind::Discover, &any, 1);
        }
        self.record_progress(ObjectiveKind::Collect, specimen_id, 1);
    }

    fn record_progress(&mut self, kind: ObjectiveKind, target: &str, amount: u32) {
        for completion in self.quests.record(kind, target, amount) {
            self.apply_rewards(&completion);
        }
    }

    fn apply_rewards(&mut self, completion: &QuestCompletion) {
        for reward in &completion.rewards {
            match reward.kind {
                RewardKind::Unlock => {
                    if !self.specimens.unlock_entry(&reward.target) {
                        log::warn!("Reward unlock {} had no effect", reward.target);
                    }
                }
                kind => {
                    let Some(player) = self.player_mut() else {
                        continue;
                    };
                    match kind {
                        RewardKind::Health => player.heal(reward.amount as f32),
                        RewardKind::Rations => player.add_rations(reward.amount as f32),
                        RewardKind::Item => {
                            player.inventory_mut().add(reward.target.clone(), reward.amount);
                        }
                        RewardKind::Gold => player.inventory_mut().add_gold(reward.amount),
                        RewardKind::Unlock => {}
                    }
                }
            }
        }

        self.score += completion.experience as u64;
        self.notice(&format!("Quest complete: {}", completion.name));
        let volume = self.config.audio.effective_sfx_volume();
        self.services.audio.play_sfx("quest_complete", volume);
    }

    // ==================== Presentation ====================

    fn notice(&mut self, text: &str) {
        log::info!("{}", text);
        self.services.renderer.update_text(TextLabel::Notice, text);
    }

    fn update_hud(&mut self) {
        let Some(entity) = self.engine.entity(PLAYER_ID) else {
            return;
        };
        let speed = entity.velocity().length() * self.config.navigation.distance_scale;
        let Some(stats) = entity.as_player().map(Player::stats) else {
            return;
        };

        let location = if self.navigation.is_traveling() {
            let progress = self.navigation.state().progress_percent.floor();
            self.navigation
                .target_node()
                .map(|n| format!("→ {} ({:.0}%)", n.name, progress))
        } else {
            self.navigation
                .current_node()
                .map(|n| format!("Location: {}", n.name))
        };

        let renderer = &mut self.services.renderer;
        renderer.update_text(TextLabel::Score, &format!("Score: {}", self.score));
        renderer.update_text(TextLabel::Health, &format!("Health: {:.0}", stats.health));
        renderer.update_text(TextLabel::Lives, &format!("Lives: {}", stats.lives));
        renderer.update_text(TextLabel::Distance, &format!("Distance: {:.0}m", stats.distance));
        let combo = if stats.combo > 0 {
            format!("Combo: x{}", stats.combo)
        } else {
            String::new()
        };
        renderer.update_text(TextLabel::Combo, &combo);
        renderer.update_text(TextLabel::Speed, &format!("Speed: {:.1} m/s", speed));
        if let Some(location) = location {
            renderer.update_text(TextLabel::Location, &location);
        }
    }

    fn draw(&mut self, report: &TickReport) {
        for id in &report.removed {
            self.services.renderer.remove_entity(id);
            if self.current_fork.as_deref() == Some(id.as_str()) {
                self.current_fork = None;
            }
        }
        for entity in self.engine.entities().all() {
            self.services.renderer.draw_entity(&entity.snapshot());
        }
    }

    /// Drop everything that left the screen; obstacles that got past score
    /// avoidance points.
    fn reap_off_screen(&mut self) {
        let height = self.viewport.height;
        let gone: Vec<(String, bool)> = self
            .engine
            .entities()
            .all()
            .filter(|e| e.is_off_screen(height))
            .filter(|e| self.current_fork.as_deref() != Some(e.id()))
            .map(|e| (e.id().to_string(), matches!(e.kind(), EntityKind::Obstacle(_))))
            .collect();

        for (id, avoided) in gone {
            self.engine.remove_entity(&id);
            self.services.renderer.remove_entity(&id);
            if !avoided {
                continue;
            }
            let combo = self.player().map_or(0, Player::combo);
            self.score += (AVOID_POINTS * (1.0 + combo as f32 * 0.1)).floor() as u64;
            if let Some(player) = self.player_mut() {
                player.record_obstacle_avoided();
            }
        }
    }

    fn spawn_due(&mut self, delta_ms: f32) {
        let requests = self
            .spawner
            .update(delta_ms, self.game_time_ms, self.viewport.width, &mut self.rng);
        for request in requests {
            self.spawn(request);
        }
    }

    fn spawn(&mut self, request: SpawnRequest) -> bool {
        let (entity, shape, options) = request.into_parts();
        let id = entity.id().to_string();
        match self.engine.spawn(entity, shape, options) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Failed to spawn {}: {}", id, e);
                false
            }
        }
    }

    fn end_game(&mut self) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.engine.stop();
        self.services.audio.stop_music();
        let volume = self.config.audio.effective_sfx_volume();
        self.services.audio.play_sfx("game_over", volume);
        self.notice(&format!("Game over! Final score: {}", self.score));
    }

    // ==================== Queries ====================

    pub fn player(&self) -> Option<&Player> {
        self.engine.entity(PLAYER_ID).and_then(Entity::as_player)
    }

    fn player_mut(&mut self) -> Option<&mut Player> {
        self.engine.entity_mut(PLAYER_ID).and_then(Entity::as_player_mut)
    }

    pub fn player_stats(&self) -> Option<PlayerStats> {
        self.player().map(Player::stats)
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn game_time_ms(&self) -> f64 {
        self.game_time_ms
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Dead, or out of river
    pub fn is_over(&self) -> bool {
        self.game_over || self.journey_complete
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_journey_complete(&self) -> bool {
        self.journey_complete
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Id of the fork marker on screen
    pub fn current_fork(&self) -> Option<&str> {
        self.current_fork.as_deref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationManager {
        &self.navigation
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    pub fn quests(&self) -> &QuestManager {
        &self.quests
    }

    pub fn specimens(&self) -> &SpecimenManager {
        &self.specimens
    }

    pub fn dialogues(&self) -> &DialogueLibrary {
        &self.dialogues
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateManager {
        &mut self.state
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GameEngine {
        &mut self.engine
    }

    /// Fails until [`start`](Self::start) has put the canoe on the water.
    pub fn require_started(&self) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(GameError::NotStarted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rio_engine::EntitySnapshot;

    struct NullRenderer;

    impl crate::services::Renderer for NullRenderer {
        fn viewport(&self) -> Viewport {
            Viewport::new(800.0, 600.0)
        }

        fn draw_entity(&mut self, _snapshot: &EntitySnapshot) {}

        fn remove_entity(&mut self, _id: &str) {}

        fn update_text(&mut self, _label: TextLabel, _text: &str) {}
    }

    struct NullOverlay;

    impl crate::services::OverlayHost for NullOverlay {
        fn open_overlay(&mut self, _overlay: &Overlay) {}

        fn close_overlay(&mut self) {}
    }

    fn started_game() -> Game {
        let content = GameContent::amazon().unwrap();
        let services = Services::new(Box::new(NullRenderer), Box::new(NullOverlay));
        let mut game = Game::new(GameConfig::default().with_seed(11), content, services).unwrap();
        game.start().unwrap();
        game
    }

    #[test]
    fn test_start_puts_canoe_on_water() {
        let game = started_game();
        assert!(game.is_started());
        assert!(game.engine().entity(PLAYER_ID).is_some());
        assert_eq!(game.state().current(), ScreenState::River);
        assert!(game.navigation().is_traveling());
        assert_eq!(game.navigation().state().target_node_id.as_deref(), Some("breves"));
        assert!(game.require_started().is_ok());
    }

    #[test]
    fn test_unreachable_first_target_spawns_nothing() {
        let mut config = GameConfig::default().with_seed(11);
        config.navigation.first_target = Some("iquitos".to_string());
        let services = Services::new(Box::new(NullRenderer), Box::new(NullOverlay));
        let mut game = Game::new(config, GameContent::amazon().unwrap(), services).unwrap();

        for _ in 0..2 {
            assert!(matches!(
                game.start(),
                Err(GameError::Navigation(NavigationError::Unreachable { .. }))
            ));
        }
        assert!(!game.is_started());
        assert!(game.player().is_none());
        assert!(game.engine().entities().is_empty());
        assert!(!game.navigation().is_traveling());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut game = started_game();
        game.pause();
        assert!(game.engine().is_paused());
        assert_eq!(game.state().current(), ScreenState::Paused);
        assert!(game.step().is_none());

        game.resume();
        assert!(!game.engine().is_paused());
        assert_eq!(game.state().current(), ScreenState::River);
        assert!(game.step().is_some());
    }

    #[test]
    fn test_dialogue_effects() {
        let mut game = started_game();
        game.apply_dialogue_effect(&DialogueEffect::ChangeHealth { amount: -30.0 });
        assert_relative_eq!(game.player_stats().unwrap().health, 70.0);
        game.apply_dialogue_effect(&DialogueEffect::ChangeHealth { amount: 10.0 });
        assert_relative_eq!(game.player_stats().unwrap().health, 80.0);

        let rations = game.player().unwrap().rations();
        game.apply_dialogue_effect(&DialogueEffect::ChangeRations { amount: -5.0 });
        assert_relative_eq!(game.player().unwrap().rations(), rations - 5.0);

        game.apply_dialogue_effect(&DialogueEffect::AddItem {
            item: "machete".to_string(),
            quantity: 2,
        });
        game.apply_dialogue_effect(&DialogueEffect::RemoveItem {
            item: "machete".to_string(),
            quantity: 1,
        });
        assert_eq!(game.player().unwrap().inventory().count("machete"), 1);

        game.apply_dialogue_effect(&DialogueEffect::UnlockLocation {
            node_id: "tefe".to_string(),
        });
        assert!(game.events().flag("unlocked_tefe"));
    }

    #[test]
    fn test_quest_completion_pays_rewards() {
        let mut game = started_game();
        game.quests.start_quest("healing_herbs_quest").unwrap();
        let medicine = game.player().unwrap().inventory().count("medicine");

        game.record_progress(ObjectiveKind::Collect, "plant_medicinal_herb", 4);
        assert!(game.quests().is_active("healing_herbs_quest"));
        game.record_progress(ObjectiveKind::Collect, "plant_medicinal_herb", 1);

        assert!(!game.quests().is_active("healing_herbs_quest"));
        assert_eq!(game.player().unwrap().inventory().count("medicine"), medicine + 3);
    }

    #[test]
    fn test_specimen_discovery_counts_once() {
        let mut game = started_game();
        game.quests.start_quest("wildlife_photography_quest").unwrap();

        game.collect_specimen("creature_jaguar");
        game.collect_specimen("creature_jaguar");
        assert_eq!(game.specimens().stats().discovered_specimens, 1);

        game.collect_specimen("creature_anaconda");
        assert!(game.quests().is_active("wildlife_photography_quest"));
        game.collect_specimen("creature_otter_giant");
        assert!(!game.quests().is_active("wildlife_photography_quest"));
        assert!(game.player().unwrap().inventory().has("camera"));
    }

    #[test]
    fn test_destroy_releases_entities() {
        let mut game = started_game();
        game.step();
        game.destroy();
        assert!(game.engine().entities().is_empty());
        assert!(!game.is_started());
        assert_eq!(game.state().current(), ScreenState::Boot);
    }
}
