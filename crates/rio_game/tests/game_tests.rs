//! End-to-end runs on a tiny river: camp → bend → (lagoon | falls)

use approx::assert_relative_eq;
use parking_lot::Mutex;
use rio_engine::{BodyOptions, BodyShape, Entity, EntitySnapshot, EntityType, Obstacle, ObstacleType};
use rio_game::prelude::*;
use rio_math::Vec2;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Screen {
    labels: BTreeMap<TextLabel, String>,
    notices: Vec<String>,
    drawn: Vec<String>,
    removed: Vec<String>,
    opened: Vec<Overlay>,
    closed: usize,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Screen>>);

impl Renderer for Recorder {
    fn viewport(&self) -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    fn draw_entity(&mut self, snapshot: &EntitySnapshot) {
        self.0.lock().drawn.push(snapshot.id.clone());
    }

    fn remove_entity(&mut self, id: &str) {
        self.0.lock().removed.push(id.to_string());
    }

    fn update_text(&mut self, label: TextLabel, text: &str) {
        let mut screen = self.0.lock();
        if label == TextLabel::Notice {
            screen.notices.push(text.to_string());
        }
        screen.labels.insert(label, text.to_string());
    }
}

impl OverlayHost for Recorder {
    fn open_overlay(&mut self, overlay: &Overlay) {
        self.0.lock().opened.push(overlay.clone());
    }

    fn close_overlay(&mut self) {
        self.0.lock().closed += 1;
    }
}

const MAP: &str = r#"{
    "name": "Test Creek",
    "nodes": [
        { "id": "camp", "name": "Camp", "type": "START" },
        { "id": "bend", "name": "Bend", "type": "JUNCTION" },
        { "id": "lagoon", "name": "Lagoon", "type": "DESTINATION" },
        { "id": "falls", "name": "Falls", "type": "DESTINATION" }
    ],
    "segments": [
        { "id": "camp_bend", "from": "camp", "to": "bend", "distance": 5, "current_speed": 1.0 },
        { "id": "bend_lagoon", "from": "bend", "to": "lagoon", "distance": 5, "current_speed": 1.0 },
        { "id": "bend_falls", "from": "bend", "to": "falls", "distance": 5, "current_speed": 2.0 }
    ]
}"#;

const QUESTS: &str = r#"[
    {
        "id": "survive_rapids",
        "name": "Run the Rapids",
        "objectives": [
            { "id": "clear", "description": "Survive the rapids", "type": "survive", "target": "rapids", "required": 1 }
        ],
        "rewards": [
            { "type": "item", "target": "compass", "amount": 1 }
        ],
        "experience": 50
    }
]"#;

const DIALOGUES: &str = r#"[
    {
        "id": "ranger_hello",
        "name": "Ranger",
        "start_node_id": "hello",
        "nodes": [
            {
                "id": "hello",
                "speaker": "Ranger",
                "text": "Need a hand?",
                "choices": [
                    { "id": "yes", "text": "Yes please.", "next_node_id": "gift" },
                    { "id": "no", "text": "No thanks.", "next_node_id": null }
                ]
            },
            {
                "id": "gift",
                "speaker": "Ranger",
                "text": "Take this.",
                "effect": { "type": "add_item", "item": "machete", "quantity": 1 }
            }
        ]
    }
]"#;

fn location_event(id: &str, node: &str, payload: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "name": "{id}",
            "trigger": {{
                "type": "LOCATION",
                "conditions": [ {{ "type": "location", "key": "{node}", "operator": "equals", "value": "{node}" }} ]
            }},
            "payload": {payload}
        }}"#
    )
}

fn content(events: &[String]) -> GameContent {
    let json = format!(
        r#"{{ "map": {MAP}, "events": [{}], "quests": {QUESTS}, "dialogues": {DIALOGUES} }}"#,
        events.join(",")
    );
    GameContent::from_json(&json).unwrap()
}

fn config() -> GameConfig {
    let mut config = GameConfig::default().with_seed(3);
    config.navigation.start_node = "camp".to_string();
    config.navigation.first_target = None;
    config.navigation.dwell_ms = 0.0;
    config.navigation.fork_resolve_distance = 100.0;
    config.gameplay.event_check_interval_ms = 100.0;
    config.spawn.obstacle_interval_ms = 1.0e9;
    config.spawn.obstacle_min_interval_ms = 1.0e9;
    config.spawn.collectible_interval_ms = 1.0e9;
    config.spawn.whirlpool_interval_ms = 1.0e9;
    config
}

/// Never leaves camp: no distance is credited toward the next node.
fn moored() -> GameConfig {
    let mut config = config();
    config.navigation.distance_scale = 0.0;
    config
}

fn start(config: GameConfig, events: &[String]) -> (Game, Recorder) {
    let recorder = Recorder::default();
    let services = Services::new(Box::new(recorder.clone()), Box::new(recorder.clone()));
    let mut game = Game::new(config, content(events), services).unwrap();
    game.start().unwrap();
    (game, recorder)
}

fn run_until(game: &mut Game, max_ticks: usize, done: impl Fn(&Game) -> bool) -> usize {
    for tick in 0..max_ticks {
        if done(game) {
            return tick;
        }
        if game.step().is_none() {
            break;
        }
    }
    max_ticks
}

/// Drop the opening obstacle so only hand-placed entities touch the canoe.
fn clear_river(game: &mut Game) {
    for id in game.engine().entities().ids_of_type(EntityType::Obstacle) {
        game.engine_mut().remove_entity(&id);
    }
}

fn canoe_position(game: &Game) -> Vec2 {
    game.engine().entity(PLAYER_ID).unwrap().position()
}

fn health(game: &Game) -> f32 {
    game.player().unwrap().health()
}

fn lives(game: &Game) -> u32 {
    game.player().unwrap().lives()
}

fn drop_rock(game: &mut Game, id: &str) {
    let at = canoe_position(game) + Vec2::new(0.0, -30.0);
    let rock = Entity::obstacle(id, at, Obstacle::new(ObstacleType::Rock));
    game.engine_mut()
        .spawn(rock, BodyShape::circle(30.0), BodyOptions::solid())
        .unwrap();
}

fn drop_whirlpool(game: &mut Game, id: &str, offset: Vec2) {
    let at = canoe_position(game) + offset;
    game.engine_mut()
        .spawn(Entity::whirlpool(id, at), BodyShape::circle(60.0), BodyOptions::sensor())
        .unwrap();
}

#[test]
fn test_unchosen_fork_takes_first_branch() {
    let (mut game, recorder) = start(config(), &[]);

    run_until(&mut game, 100, |g| g.current_fork().is_some());
    let fork_id = game.current_fork().map(str::to_string).unwrap();

    run_until(&mut game, 3000, Game::is_journey_complete);
    assert!(game.is_journey_complete());
    assert!(!game.is_game_over());
    assert_eq!(game.navigation().state().current_node_id, "lagoon");
    assert!(!game.engine().is_running());

    let screen = recorder.0.lock();
    assert!(screen.removed.contains(&fork_id));
    assert!(screen.notices.iter().any(|n| n.starts_with("Fork ahead")));
    assert!(screen.notices.iter().any(|n| n.starts_with("Journey complete")));
}

#[test]
fn test_chosen_fork_branch_is_followed() {
    let (mut game, _recorder) = start(config(), &[]);

    run_until(&mut game, 100, |g| g.current_fork().is_some());
    assert!(game.choose_fork(1));
    assert!(!game.choose_fork(0));

    run_until(&mut game, 3000, Game::is_journey_complete);
    assert_eq!(game.navigation().state().current_node_id, "falls");
}

#[test]
fn test_dialogue_overlay_pauses_until_closed() {
    let events = [location_event(
        "ranger",
        "camp",
        r#"{ "type": "DIALOGUE", "dialogue_id": "ranger_hello" }"#,
    )];
    let (mut game, recorder) = start(config(), &events);

    run_until(&mut game, 60, |g| g.state().current() == ScreenState::Dialogue);
    assert_eq!(game.state().current(), ScreenState::Dialogue);
    assert!(game.engine().is_paused());
    assert!(game.step().is_none());
    assert_eq!(game.dialogue_choices().len(), 2);

    let machetes = game.player().unwrap().inventory().count("machete");
    assert!(game.advance_dialogue(Some(0)));
    assert_eq!(game.dialogue_node().map(|n| n.id.as_str()), Some("gift"));
    assert_eq!(game.player().unwrap().inventory().count("machete"), machetes + 1);

    assert!(game.advance_dialogue(None));
    assert_eq!(game.state().current(), ScreenState::River);
    assert!(!game.engine().is_paused());
    assert!(game.step().is_some());

    let screen = recorder.0.lock();
    assert_eq!(screen.closed, 1);
    assert!(matches!(
        screen.opened.first(),
        Some(Overlay::Dialogue { dialogue_id, .. }) if dialogue_id == "ranger_hello"
    ));
}

#[test]
fn test_surviving_hazard_completes_quest() {
    let events = [
        location_event("briefing", "camp", r#"{ "type": "QUEST", "quest_id": "survive_rapids" }"#),
        location_event(
            "white_water",
            "bend",
            r#"{ "type": "HAZARD", "hazard_type": "rapids", "damage": 20, "rations_lost": 5 }"#,
        ),
    ];
    let (mut game, _recorder) = start(config(), &events);

    run_until(&mut game, 30, |g| g.quests().is_active("survive_rapids"));
    assert!(game.quests().is_active("survive_rapids"));

    run_until(&mut game, 600, |g| !g.quests().is_active("survive_rapids"));
    let player = game.player().unwrap();
    assert!(player.health() <= 80.0);
    assert!(player.inventory().has("compass"));
    assert!(game.score() >= 50);
    assert_eq!(game.events().stats().completed_events, 2);
}

#[test]
fn test_fatal_hazard_ends_game() {
    let events = [location_event(
        "landslide",
        "camp",
        r#"{ "type": "HAZARD", "hazard_type": "storm", "damage": 500 }"#,
    )];
    let mut config = config();
    config.player.lives = 1;
    let (mut game, recorder) = start(config, &events);

    run_until(&mut game, 60, Game::is_over);
    assert!(game.is_game_over());
    assert!(!game.engine().is_running());
    assert!(game.step().is_none());
    assert!(recorder.0.lock().notices.iter().any(|n| n.starts_with("Game over")));
}

#[test]
fn test_passed_obstacle_scores_points() {
    let (mut game, recorder) = start(config(), &[]);
    let rock = Entity::obstacle("rock_test", Vec2::new(60.0, 760.0), Obstacle::new(ObstacleType::Rock));
    game.engine_mut()
        .spawn(rock, BodyShape::circle(30.0), BodyOptions::solid())
        .unwrap();

    game.step();
    assert!(game.engine().entity("rock_test").is_none());
    assert_eq!(game.score(), 10);
    assert_eq!(game.player_stats().map(|s| s.combo), Some(1));
    assert!(recorder.0.lock().removed.iter().any(|id| id == "rock_test"));
}

#[test]
fn test_hud_reports_progress() {
    let (mut game, recorder) = start(config(), &[]);
    game.step();

    let screen = recorder.0.lock();
    assert_eq!(screen.labels.get(&TextLabel::Score).map(String::as_str), Some("Score: 0"));
    assert_eq!(screen.labels.get(&TextLabel::Lives).map(String::as_str), Some("Lives: 3"));
    assert!(screen.labels[&TextLabel::Location].starts_with("→ Bend"));
    assert!(screen.drawn.iter().any(|id| id == PLAYER_ID));
}

#[test]
fn test_second_dialogue_waits_for_open_overlay() {
    let hello = r#"{ "type": "DIALOGUE", "dialogue_id": "ranger_hello" }"#;
    let events = [
        location_event("ranger_first", "camp", hello),
        location_event("ranger_second", "camp", hello),
    ];
    let (mut game, recorder) = start(moored(), &events);

    run_until(&mut game, 60, |g| g.state().current() == ScreenState::Dialogue);
    assert!(game.events().is_completed("ranger_first"));
    assert!(!game.events().is_active("ranger_second"));
    assert!(!game.events().is_completed("ranger_second"));

    assert!(game.advance_dialogue(Some(1)));
    assert_eq!(game.state().current(), ScreenState::River);

    run_until(&mut game, 60, |g| g.state().current() == ScreenState::Dialogue);
    assert_eq!(game.state().current(), ScreenState::Dialogue);
    assert!(game.events().is_completed("ranger_second"));
    assert_eq!(recorder.0.lock().opened.len(), 2);
}

#[test]
fn test_whirlpool_pulls_and_wears_down_within_reach() {
    let (mut game, _recorder) = start(moored(), &[]);
    clear_river(&mut game);

    // Beyond the pull radius nothing happens
    let home = canoe_position(&game);
    drop_whirlpool(&mut game, "whirlpool_far", Vec2::new(-160.0, 0.0));
    for _ in 0..30 {
        game.step();
    }
    assert_relative_eq!(health(&game), 100.0);
    assert_relative_eq!(canoe_position(&game).x, home.x, epsilon = 0.5);
    game.engine_mut().remove_entity("whirlpool_far");

    let before = canoe_position(&game);
    drop_whirlpool(&mut game, "whirlpool_near", Vec2::new(50.0, 0.0));
    let mut drops = Vec::new();
    let mut last = health(&game);
    for tick in 0..60 {
        game.step();
        let now = health(&game);
        if now < last {
            drops.push((tick, last - now));
            last = now;
        }
    }

    assert!(canoe_position(&game).x > before.x + 5.0);
    // 5 hp/s in 200 ms bites over one second
    assert!((4..=5).contains(&drops.len()), "{:?}", drops);
    for (_, amount) in &drops {
        assert_relative_eq!(*amount, 1.0, epsilon = 1e-4);
    }
    for pair in drops.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= 11, "{:?}", drops);
    }
}

#[test]
fn test_rock_costs_a_life_then_grace_period_blocks_hits() {
    let (mut game, _recorder) = start(moored(), &[]);
    clear_river(&mut game);
    game.apply_dialogue_effect(&DialogueEffect::ChangeHealth { amount: -90.0 });
    assert_relative_eq!(health(&game), 10.0);

    drop_rock(&mut game, "rock_a");
    run_until(&mut game, 10, |g| lives(g) == 2);
    assert_eq!(lives(&game), 2);
    assert_relative_eq!(health(&game), 100.0);
    assert!(game.player().unwrap().is_invincible());
    game.engine_mut().remove_entity("rock_a");

    drop_rock(&mut game, "rock_b");
    for _ in 0..5 {
        game.step();
    }
    assert_relative_eq!(health(&game), 100.0);
    assert_eq!(lives(&game), 2);
    game.engine_mut().remove_entity("rock_b");

    // 2000 ms at 60 Hz
    let grace = 5 + run_until(&mut game, 200, |g| !g.player().unwrap().is_invincible());
    assert!((110..=125).contains(&grace), "grace lasted {} ticks", grace);

    drop_rock(&mut game, "rock_c");
    run_until(&mut game, 10, |g| health(g) < 100.0);
    assert_relative_eq!(health(&game), 85.0);
    assert_eq!(lives(&game), 2);
    assert!(!game.is_over());
}
