//! Event definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Dialogue,
    Hazard,
    Discovery,
    Trade,
    Quest,
    Encounter,
    Environmental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    Location,
    Collision,
    Random,
    Time,
    Distance,
    Health,
    Item,
    Rations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Flag,
    Item,
    Health,
    Location,
    Distance,
    Time,
    Rations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOperator {
    #[default]
    Equals,
    Greater,
    Less,
    Has,
    Not,
}

/// A condition operand as authored in content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl EventValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EventValue::Number(n) => Some(*n),
            EventValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            EventValue::Text(s) => s.parse().ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EventValue::Bool(b) => Some(*b),
            EventValue::Number(n) => Some(*n != 0.0),
            EventValue::Text(s) => s.parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EventValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One predicate over the context; all conditions of a trigger are AND-ed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCondition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[serde(default)]
    pub operator: ConditionOperator,
    /// Flag name, item id or location id; informational for numeric kinds
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EventValue>,
}

impl EventCondition {
    pub fn new(kind: ConditionKind, operator: ConditionOperator, key: impl Into<String>) -> Self {
        Self {
            kind,
            operator,
            key: key.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: EventValue) -> Self {
        self.value = Some(value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTrigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    /// Per-check chance for RANDOM triggers; unset means always
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default)]
    pub conditions: Vec<EventCondition>,
}

impl EventTrigger {
    pub fn new(trigger_type: TriggerType) -> Self {
        Self {
            trigger_type,
            probability: None,
            conditions: Vec::new(),
        }
    }

    pub fn random(probability: f64) -> Self {
        Self {
            probability: Some(probability),
            ..Self::new(TriggerType::Random)
        }
    }

    pub fn with_condition(mut self, condition: EventCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardType {
    Storm,
    Rapids,
    Whirlpool,
    Rocks,
    Wildlife,
}

impl HazardType {
    /// Content key, as written in JSON
    pub fn as_str(self) -> &'static str {
        match self {
            HazardType::Storm => "storm",
            HazardType::Rapids => "rapids",
            HazardType::Whirlpool => "whirlpool",
            HazardType::Rocks => "rocks",
            HazardType::Wildlife => "wildlife",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryType {
    Specimen,
    Location,
    Npc,
    Item,
}

/// What a dispatched event does, tagged by event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    Dialogue {
        dialogue_id: String,
    },
    Hazard {
        hazard_type: HazardType,
        damage: f32,
        #[serde(default)]
        rations_lost: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed_modifier: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discovery_id: Option<String>,
    },
    Discovery {
        discovery_type: DiscoveryType,
        discovery_id: String,
    },
    Trade {
        merchant_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dialogue_id: Option<String>,
    },
    Quest {
        quest_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dialogue_id: Option<String>,
    },
    Encounter {
        #[serde(default)]
        hostile: bool,
        #[serde(default)]
        damage: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dialogue_id: Option<String>,
    },
    Environmental {
        speed_modifier: f32,
        duration_ms: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weather_effect: Option<String>,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::Dialogue { .. } => EventType::Dialogue,
            EventPayload::Hazard { .. } => EventType::Hazard,
            EventPayload::Discovery { .. } => EventType::Discovery,
            EventPayload::Trade { .. } => EventType::Trade,
            EventPayload::Quest { .. } => EventType::Quest,
            EventPayload::Encounter { .. } => EventType::Encounter,
            EventPayload::Environmental { .. } => EventType::Environmental,
        }
    }
}

/// A registered encounter rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger: EventTrigger,
    pub payload: EventPayload,
    #[serde(default)]
    pub repeatable: bool,
    /// Game-time ms before the event may fire again
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<f64>,
    /// Flags raised when the event is dispatched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set_flags: Vec<String>,
}

impl GameEvent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger: EventTrigger, payload: EventPayload) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            trigger,
            payload,
            repeatable: false,
            cooldown_ms: None,
            set_flags: Vec::new(),
        }
    }

    pub fn repeatable(mut self, cooldown_ms: Option<f64>) -> Self {
        self.repeatable = true;
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn with_cooldown(mut self, cooldown_ms: f64) -> Self {
        self.cooldown_ms = Some(cooldown_ms);
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.set_flags.push(flag.into());
        self
    }

    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectType {
    Health,
    Rations,
    Item,
    Flag,
    Unlock,
    Quest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEffect {
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub target: String,
    pub value: EventValue,
}

/// Outcome attached when an event is completed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub effects: Vec<EventEffect>,
}

impl EventResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect_type: EffectType, target: impl Into<String>, value: EventValue) -> Self {
        self.effects.push(EventEffect {
            effect_type,
            target: target.into(),
            value,
        });
        self
    }
}

/// A fired event awaiting completion
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEvent {
    pub event_id: String,
    /// Game time the event fired
    pub triggered_at_ms: f64,
    pub completed: bool,
    pub result: Option<EventResult>,
}
