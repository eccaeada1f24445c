//! # rio_events - Encounter Rules
//!
//! Registers declarative [`GameEvent`]s and evaluates their triggers against
//! a per-tick [`EventContext`] snapshot.
//!
//! ## Lifecycle
//!
//! ```text
//! registered ──check_triggers──► eligible ──trigger_event──► active
//!     ▲                                                        │
//!     │ repeatable (after cooldown)                  complete_event
//!     └────────────────────────────────────────────────────────┤
//!                                                              ▼
//!                                          completed (non-repeatable: never again)
//! ```
//!
//! [`EventManager::check_triggers`] never mutates; the caller decides which
//! eligible events to dispatch and must complete them itself.
//!
//! ## Example
//!
//! ```ignore
//! use rio_events::prelude::*;
//!
//! let mut events = EventManager::new();
//! events.register_events(content.events);
//!
//! let ctx = EventContext::default().at("belem");
//! let due: Vec<String> = events.check_triggers(&ctx, &mut rng).iter().map(|e| e.id.clone()).collect();
//! for id in due {
//!     events.trigger_event(&id, ctx.game_time_ms)?;
//!     // ... apply the payload ...
//!     events.complete_event(&id, None);
//! }
//! ```

pub mod context;
pub mod error;
pub mod event;
pub mod manager;

pub mod prelude {
    pub use crate::context::EventContext;
    pub use crate::error::{EventError, Result};
    pub use crate::event::{
        ActiveEvent, ConditionKind, ConditionOperator, DiscoveryType, EffectType, EventCondition,
        EventEffect, EventPayload, EventResult, EventTrigger, EventType, EventValue, GameEvent,
        HazardType, TriggerType,
    };
    pub use crate::manager::{EventManager, EventStats};
}

pub use prelude::*;
