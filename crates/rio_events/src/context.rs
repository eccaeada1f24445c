//! Game state snapshot for trigger evaluation

use std::collections::BTreeMap;

/// What the rules can see this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContext {
    /// Node the player is at, or departed from while traveling
    pub current_location: Option<String>,
    /// Game time in ms; paused time does not count
    pub game_time_ms: f64,
    pub distance_traveled: f32,
    pub health: f32,
    pub rations: f32,
    pub inventory: BTreeMap<String, u32>,
    /// Entity the player just touched, if any
    pub collision_entity: Option<String>,
}

impl EventContext {
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.current_location = Some(location.into());
        self
    }

    pub fn with_time(mut self, game_time_ms: f64) -> Self {
        self.game_time_ms = game_time_ms;
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance_traveled = distance;
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }

    pub fn with_rations(mut self, rations: f32) -> Self {
        self.rations = rations;
        self
    }

    pub fn with_item(mut self, item_id: impl Into<String>, count: u32) -> Self {
        self.inventory.insert(item_id.into(), count);
        self
    }

    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inventory.get(item_id).copied().unwrap_or(0)
    }
}
