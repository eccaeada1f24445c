//! Event registry and trigger evaluation

use crate::context::EventContext;
use crate::error::{EventError, Result};
use crate::event::{
    ActiveEvent, ConditionKind, ConditionOperator, EventCondition, EventResult, EventTrigger,
    EventValue, GameEvent, TriggerType,
};
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub total_events: usize,
    pub active_events: usize,
    pub completed_events: usize,
    pub flags: usize,
}

/// Registry of encounter rules and their runtime state.
///
/// Flags live in one flat namespace shared by every event.
#[derive(Debug, Default)]
pub struct EventManager {
    /// Registration order is evaluation order
    events: Vec<GameEvent>,
    index: HashMap<String, usize>,
    active: BTreeMap<String, ActiveEvent>,
    completed: HashSet<String>,
    results: HashMap<String, EventResult>,
    flags: HashMap<String, bool>,
    /// Game time at which each cooldown ends
    cooldowns: HashMap<String, f64>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event, replacing any earlier event with the same id.
    pub fn register_event(&mut self, event: GameEvent) -> Result<()> {
        if let Some(p) = event.trigger.probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(EventError::InvalidEvent {
                    id: event.id,
                    reason: format!("probability {} outside [0, 1]", p),
                });
            }
        }

        log::debug!("Registered event: {}", event.id);
        match self.index.get(&event.id) {
            Some(&i) => self.events[i] = event,
            None => {
                self.index.insert(event.id.clone(), self.events.len());
                self.events.push(event);
            }
        }
        Ok(())
    }

    /// Register many events; invalid ones are logged and skipped.
    /// Returns how many were registered.
    pub fn register_events(&mut self, events: impl IntoIterator<Item = GameEvent>) -> usize {
        let mut count = 0;
        for event in events {
            match self.register_event(event) {
                Ok(()) => count += 1,
                Err(e) => log::warn!("Skipping event: {}", e),
            }
        }
        count
    }

    /// Events whose triggers hold against `context`.
    ///
    /// Active events, completed one-shot events and events on cooldown are
    /// skipped. Each RANDOM trigger whose conditions hold costs one draw
    /// from `rng`.
    pub fn check_triggers<R: Rng + ?Sized>(&self, context: &EventContext, rng: &mut R) -> Vec<&GameEvent> {
        self.events
            .iter()
            .filter(|event| self.is_eligible(event, context.game_time_ms))
            .filter(|event| self.evaluate_trigger(&event.trigger, context, rng))
            .collect()
    }

    fn is_eligible(&self, event: &GameEvent, now_ms: f64) -> bool {
        if self.active.contains_key(&event.id) {
            return false;
        }
        if !event.repeatable && self.completed.contains(&event.id) {
            return false;
        }
        !self.is_on_cooldown(&event.id, now_ms)
    }

    fn evaluate_trigger<R: Rng + ?Sized>(&self, trigger: &EventTrigger, context: &EventContext, rng: &mut R) -> bool {
        let gated = if trigger.conditions.is_empty() {
            match trigger.trigger_type {
                TriggerType::Location => context.current_location.is_some(),
                TriggerType::Collision => context.collision_entity.is_some(),
                _ => true,
            }
        } else {
            trigger
                .conditions
                .iter()
                .all(|c| self.evaluate_condition(c, context))
        };

        if !gated {
            return false;
        }

        match (trigger.trigger_type, trigger.probability) {
            (TriggerType::Random, Some(p)) => rng.gen_bool(p.clamp(0.0, 1.0)),
            _ => true,
        }
    }

    fn evaluate_condition(&self, condition: &EventCondition, context: &EventContext) -> bool {
        let op = condition.operator;
        let expected = condition.value.as_ref();

        match condition.kind {
            ConditionKind::Flag => {
                let set = self.flags.get(&condition.key).copied();
                let wanted = expected.and_then(EventValue::as_bool).unwrap_or(true);
                match op {
                    ConditionOperator::Equals => set.unwrap_or(false) == wanted,
                    ConditionOperator::Not => set.unwrap_or(false) != wanted,
                    ConditionOperator::Has => set.is_some(),
                    ConditionOperator::Greater | ConditionOperator::Less => false,
                }
            }
            ConditionKind::Location => {
                let wanted = expected.and_then(EventValue::as_str).unwrap_or(&condition.key);
                let here = context.current_location.as_deref();
                match op {
                    ConditionOperator::Equals => here == Some(wanted),
                    ConditionOperator::Not => here != Some(wanted),
                    ConditionOperator::Has => here.is_some(),
                    ConditionOperator::Greater | ConditionOperator::Less => false,
                }
            }
            ConditionKind::Item => compare(context.item_count(&condition.key) as f64, expected, op),
            ConditionKind::Health => compare(context.health as f64, expected, op),
            ConditionKind::Distance => compare(context.distance_traveled as f64, expected, op),
            ConditionKind::Time => compare(context.game_time_ms, expected, op),
            ConditionKind::Rations => compare(context.rations as f64, expected, op),
        }
    }

    fn is_on_cooldown(&self, event_id: &str, now_ms: f64) -> bool {
        self.cooldowns.get(event_id).is_some_and(|&end| now_ms < end)
    }

    /// Mark an event active at game time `now_ms`, start its cooldown and
    /// raise its flags.
    pub fn trigger_event(&mut self, event_id: &str, now_ms: f64) -> Result<&GameEvent> {
        let &i = self
            .index
            .get(event_id)
            .ok_or_else(|| EventError::UnknownEvent(event_id.to_string()))?;
        if self.active.contains_key(event_id) {
            return Err(EventError::AlreadyActive(event_id.to_string()));
        }
        let event = &self.events[i];
        if !event.repeatable && self.completed.contains(event_id) {
            return Err(EventError::AlreadyCompleted(event_id.to_string()));
        }

        if let Some(cooldown) = event.cooldown_ms {
            self.cooldowns.insert(event_id.to_string(), now_ms + cooldown);
        }
        for flag in &event.set_flags {
            self.flags.insert(flag.clone(), true);
        }
        self.active.insert(
            event_id.to_string(),
            ActiveEvent {
                event_id: event_id.to_string(),
                triggered_at_ms: now_ms,
                completed: false,
                result: None,
            },
        );

        log::info!("Triggered event: {}", event.name);
        Ok(event)
    }

    /// Finish an active event. Returns false when it was not active.
    pub fn complete_event(&mut self, event_id: &str, result: Option<EventResult>) -> bool {
        let Some(mut active) = self.active.remove(event_id) else {
            log::debug!("Complete ignored, event not active: {}", event_id);
            return false;
        };
        active.completed = true;

        if let Some(result) = result {
            self.results.insert(event_id.to_string(), result);
        }
        let repeatable = self.event(event_id).is_some_and(|e| e.repeatable);
        if !repeatable {
            self.completed.insert(event_id.to_string());
        }
        log::debug!("Completed event: {}", event_id);
        true
    }

    // ==================== Flags ====================

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        let key = key.into();
        log::debug!("Flag set: {} = {}", key, value);
        self.flags.insert(key, value);
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn clear_flag(&mut self, key: &str) -> bool {
        self.flags.remove(key).is_some()
    }

    // ==================== Queries ====================

    pub fn event(&self, event_id: &str) -> Option<&GameEvent> {
        self.index.get(event_id).map(|&i| &self.events[i])
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn active_events(&self) -> impl Iterator<Item = &ActiveEvent> {
        self.active.values()
    }

    pub fn is_active(&self, event_id: &str) -> bool {
        self.active.contains_key(event_id)
    }

    pub fn is_completed(&self, event_id: &str) -> bool {
        self.completed.contains(event_id)
    }

    pub fn result(&self, event_id: &str) -> Option<&EventResult> {
        self.results.get(event_id)
    }

    pub fn stats(&self) -> EventStats {
        EventStats {
            total_events: self.events.len(),
            active_events: self.active.len(),
            completed_events: self.completed.len(),
            flags: self.flags.len(),
        }
    }

    /// Forget all runtime state; registrations stay.
    pub fn reset(&mut self) {
        self.active.clear();
        self.completed.clear();
        self.results.clear();
        self.flags.clear();
        self.cooldowns.clear();
        log::debug!("Event state reset");
    }
}

fn compare(actual: f64, expected: Option<&EventValue>, op: ConditionOperator) -> bool {
    let expected = expected.and_then(EventValue::as_f64);
    match op {
        ConditionOperator::Equals => expected.is_some_and(|e| (actual - e).abs() < EPSILON),
        ConditionOperator::Greater => expected.is_some_and(|e| actual > e),
        ConditionOperator::Less => expected.is_some_and(|e| actual < e),
        ConditionOperator::Has => actual > 0.0,
        ConditionOperator::Not => match expected {
            Some(e) => (actual - e).abs() >= EPSILON,
            None => actual <= 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DiscoveryType, EventPayload, HazardType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn dialogue(id: &str, trigger: EventTrigger) -> GameEvent {
        GameEvent::new(
            id,
            id,
            trigger,
            EventPayload::Dialogue { dialogue_id: format!("{}_dialogue", id) },
        )
    }

    fn welcome() -> GameEvent {
        dialogue(
            "welcome",
            EventTrigger::new(TriggerType::Location)
                .with_condition(
                    EventCondition::new(ConditionKind::Location, ConditionOperator::Equals, "belem")
                        .with_value(EventValue::Text("belem".into())),
                )
                .with_condition(
                    EventCondition::new(ConditionKind::Flag, ConditionOperator::Not, "game_started")
                        .with_value(EventValue::Bool(true)),
                ),
        )
        .with_flag("game_started")
    }

    fn ids<'a>(events: Vec<&'a GameEvent>) -> Vec<&'a str> {
        events.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_zero_probability_never_fires() {
        let mut manager = EventManager::new();
        manager
            .register_event(dialogue("never", EventTrigger::random(0.0)))
            .unwrap();
        let mut rng = rng();
        let ctx = EventContext::default();
        for _ in 0..10_000 {
            assert!(manager.check_triggers(&ctx, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_certain_probability_fires_first_call() {
        let mut manager = EventManager::new();
        manager
            .register_event(dialogue(
                "always",
                EventTrigger::random(1.0).with_condition(
                    EventCondition::new(ConditionKind::Distance, ConditionOperator::Greater, "distance")
                        .with_value(EventValue::Number(100.0)),
                ),
            ))
            .unwrap();
        let mut rng = rng();

        // Conditions gate the roll.
        let short = EventContext::default().with_distance(50.0);
        assert!(manager.check_triggers(&short, &mut rng).is_empty());

        let far = EventContext::default().with_distance(150.0);
        assert_eq!(ids(manager.check_triggers(&far, &mut rng)), vec!["always"]);
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut manager = EventManager::new();
        manager.register_event(dialogue("once", EventTrigger::new(TriggerType::Time))).unwrap();
        let mut rng = rng();
        let ctx = EventContext::default();

        let mut fired = 0;
        for tick in 0..50 {
            let due: Vec<String> = manager
                .check_triggers(&ctx, &mut rng)
                .iter()
                .map(|e| e.id.clone())
                .collect();
            for id in due {
                manager.trigger_event(&id, tick as f64).unwrap();
                fired += 1;
                if tick % 2 == 0 {
                    manager.complete_event(&id, None);
                }
            }
        }
        assert_eq!(fired, 1);
        assert!(manager.is_completed("once"));
        assert_eq!(
            manager.trigger_event("once", 100.0).unwrap_err(),
            EventError::AlreadyCompleted("once".into())
        );
    }

    #[test]
    fn test_active_event_not_reevaluated() {
        let mut manager = EventManager::new();
        manager
            .register_event(dialogue("loop", EventTrigger::new(TriggerType::Time)).repeatable(None))
            .unwrap();
        let mut rng = rng();
        let ctx = EventContext::default();

        manager.trigger_event("loop", 0.0).unwrap();
        assert!(manager.check_triggers(&ctx, &mut rng).is_empty());
        assert!(manager.complete_event("loop", None));
        assert_eq!(ids(manager.check_triggers(&ctx, &mut rng)), vec!["loop"]);
    }

    #[test]
    fn test_repeatable_event_never_counts_as_completed() {
        let mut manager = EventManager::new();
        manager
            .register_event(dialogue("ferry", EventTrigger::new(TriggerType::Time)).repeatable(None))
            .unwrap();

        for round in 0..3 {
            manager.trigger_event("ferry", f64::from(round) * 1_000.0).unwrap();
            assert!(manager.complete_event("ferry", Some(EventResult::success(format!("crossing {}", round)))));
        }

        assert!(!manager.is_active("ferry"));
        assert!(!manager.is_completed("ferry"));
        assert_eq!(manager.stats().completed_events, 0);
        assert_eq!(manager.result("ferry").and_then(|r| r.message.as_deref()), Some("crossing 2"));
    }

    #[test]
    fn test_cooldown_uses_game_time() {
        let mut manager = EventManager::new();
        manager
            .register_event(
                dialogue("merchant", EventTrigger::new(TriggerType::Distance)).repeatable(Some(300_000.0)),
            )
            .unwrap();
        let mut rng = rng();

        manager.trigger_event("merchant", 1_000.0).unwrap();
        manager.complete_event("merchant", None);

        let early = EventContext::default().with_time(300_999.0);
        assert!(manager.check_triggers(&early, &mut rng).is_empty());
        let later = EventContext::default().with_time(301_000.0);
        assert_eq!(manager.check_triggers(&later, &mut rng).len(), 1);
    }

    #[test]
    fn test_flag_not_operator_and_set_flags() {
        let mut manager = EventManager::new();
        manager.register_event(welcome()).unwrap();
        let mut rng = rng();
        let ctx = EventContext::default().at("belem");

        assert_eq!(ids(manager.check_triggers(&ctx, &mut rng)), vec!["welcome"]);
        manager.trigger_event("welcome", 0.0).unwrap();
        assert!(manager.flag("game_started"));
        manager.complete_event("welcome", Some(EventResult::success("greeted")));
        assert_eq!(manager.result("welcome").and_then(|r| r.message.as_deref()), Some("greeted"));
    }

    #[test]
    fn test_flag_condition_honours_operator() {
        let mut manager = EventManager::new();
        manager
            .register_event(dialogue(
                "needs_flag",
                EventTrigger::new(TriggerType::Location).with_condition(EventCondition::new(
                    ConditionKind::Flag,
                    ConditionOperator::Equals,
                    "met_guide",
                )),
            ))
            .unwrap();
        let mut rng = rng();
        let ctx = EventContext::default();

        assert!(manager.check_triggers(&ctx, &mut rng).is_empty());
        manager.set_flag("met_guide", true);
        assert_eq!(manager.check_triggers(&ctx, &mut rng).len(), 1);
    }

    #[test]
    fn test_fallback_without_conditions() {
        let mut manager = EventManager::new();
        manager.register_event(dialogue("arrive", EventTrigger::new(TriggerType::Location))).unwrap();
        manager.register_event(dialogue("bump", EventTrigger::new(TriggerType::Collision))).unwrap();
        let mut rng = rng();

        assert!(manager.check_triggers(&EventContext::default(), &mut rng).is_empty());
        let ctx = EventContext {
            collision_entity: Some("rock_3".into()),
            ..EventContext::default().at("breves")
        };
        assert_eq!(ids(manager.check_triggers(&ctx, &mut rng)), vec!["arrive", "bump"]);
    }

    #[test]
    fn test_numeric_conditions() {
        let mut manager = EventManager::new();
        manager
            .register_event(GameEvent::new(
                "low_rations",
                "Low rations",
                EventTrigger::new(TriggerType::Rations).with_condition(
                    EventCondition::new(ConditionKind::Rations, ConditionOperator::Less, "rations")
                        .with_value(EventValue::Number(25.0)),
                ),
                EventPayload::Hazard {
                    hazard_type: HazardType::Storm,
                    damage: 0.0,
                    rations_lost: 0.0,
                    speed_modifier: None,
                    discovery_id: None,
                },
            ))
            .unwrap();
        manager
            .register_event(GameEvent::new(
                "camera_shot",
                "Photograph",
                EventTrigger::new(TriggerType::Item).with_condition(EventCondition::new(
                    ConditionKind::Item,
                    ConditionOperator::Has,
                    "camera",
                )),
                EventPayload::Discovery {
                    discovery_type: DiscoveryType::Specimen,
                    discovery_id: "creature_macaw".into(),
                },
            ))
            .unwrap();
        let mut rng = rng();

        let ctx = EventContext::default().with_rations(40.0);
        assert!(manager.check_triggers(&ctx, &mut rng).is_empty());
        let ctx = EventContext::default().with_rations(20.0).with_item("camera", 1);
        assert_eq!(ids(manager.check_triggers(&ctx, &mut rng)), vec!["low_rations", "camera_shot"]);
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let mut manager = EventManager::new();
        let result = manager.register_event(dialogue("bad", EventTrigger::random(1.5)));
        assert!(matches!(result, Err(EventError::InvalidEvent { .. })));
        assert_eq!(manager.register_events(vec![dialogue("ok", EventTrigger::random(0.5))]), 1);
    }

    #[test]
    fn test_unknown_and_double_trigger() {
        let mut manager = EventManager::new();
        manager.register_event(welcome()).unwrap();
        assert_eq!(
            manager.trigger_event("nope", 0.0).unwrap_err(),
            EventError::UnknownEvent("nope".into())
        );
        manager.trigger_event("welcome", 0.0).unwrap();
        assert_eq!(
            manager.trigger_event("welcome", 0.0).unwrap_err(),
            EventError::AlreadyActive("welcome".into())
        );
        assert!(!manager.complete_event("nope", None));
    }

    #[test]
    fn test_stats_and_reset() {
        let mut manager = EventManager::new();
        manager.register_event(welcome()).unwrap();
        manager.trigger_event("welcome", 0.0).unwrap();

        let stats = manager.stats();
        assert_eq!(stats.total_events, 1);
        assert_eq!(stats.active_events, 1);
        assert_eq!(stats.flags, 1);

        manager.reset();
        let stats = manager.stats();
        assert_eq!(stats.active_events, 0);
        assert_eq!(stats.flags, 0);
        assert_eq!(stats.total_events, 1);
    }
}
