//! Engine notifications

use crate::entity::CollisionEffect;
use std::collections::BTreeMap;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

/// One dispatched contact, with what each side decided
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReport {
    pub a: String,
    pub b: String,
    pub sensor: bool,
    pub effect_a: Option<CollisionEffect>,
    pub effect_b: Option<CollisionEffect>,
}

impl CollisionReport {
    pub fn involves(&self, id: &str) -> bool {
        self.a == id || self.b == id
    }

    pub fn other(&self, id: &str) -> Option<&str> {
        if self.a == id {
            Some(&self.b)
        } else if self.b == id {
            Some(&self.a)
        } else {
            None
        }
    }

    /// Effects from both sides, in pair order
    pub fn effects(&self) -> impl Iterator<Item = (&str, CollisionEffect)> {
        [(&self.a, self.effect_a), (&self.b, self.effect_b)]
            .into_iter()
            .filter_map(|(id, effect)| effect.map(|e| (id.as_str(), e)))
    }
}

/// Everything one tick did, returned to the caller of `poll`/`step`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub delta_ms: f32,
    pub collisions: Vec<CollisionReport>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Tick { tick: u64, delta_ms: f32 },
    Collision(CollisionReport),
    EntityRemoved { id: String },
    Paused,
    Resumed,
    Stopped,
}

impl EngineEvent {
    pub fn kind(&self) -> EngineEventKind {
        match self {
            EngineEvent::Tick { .. } => EngineEventKind::Tick,
            EngineEvent::Collision(_) => EngineEventKind::Collision,
            EngineEvent::EntityRemoved { .. } => EngineEventKind::EntityRemoved,
            EngineEvent::Paused => EngineEventKind::Paused,
            EngineEvent::Resumed => EngineEventKind::Resumed,
            EngineEvent::Stopped => EngineEventKind::Stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineEventKind {
    Tick,
    Collision,
    EntityRemoved,
    Paused,
    Resumed,
    Stopped,
}

/// Engine event handler
pub type EngineHandler = Box<dyn Fn(&EngineEvent) + Send + Sync>;

/// Subscribers keyed by event kind, called in subscription order
#[derive(Default)]
pub(crate) struct Listeners {
    handlers: BTreeMap<EngineEventKind, Vec<(SubscriberId, EngineHandler)>>,
    next_subscriber_id: u64,
}

impl Listeners {
    pub fn subscribe(&mut self, kind: EngineEventKind, handler: EngineHandler) -> SubscriberId {
        self.next_subscriber_id += 1;
        let id = SubscriberId(self.next_subscriber_id);
        self.handlers.entry(kind).or_default().push((id, handler));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let mut removed = false;
        for handlers in self.handlers.values_mut() {
            let before = handlers.len();
            handlers.retain(|(sub_id, _)| *sub_id != id);
            removed |= handlers.len() != before;
        }
        removed
    }

    pub fn emit(&self, event: &EngineEvent) {
        if let Some(handlers) = self.handlers.get(&event.kind()) {
            for (_, handler) in handlers {
                handler(event);
            }
        }
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("count", &self.len()).finish()
    }
}
