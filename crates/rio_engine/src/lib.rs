//! # rio_engine - Simulation Core
//!
//! Entities, the [`EntityManager`] that owns them, and the [`GameEngine`]
//! scheduler that advances physics and resolves contacts at a fixed rate.
//!
//! ## Tick order
//!
//! Every tick runs the same five stages, in this order:
//!
//! 1. Drain and dispatch queued [`EngineCommand`]s
//! 2. Advance physics, then sync and update every active entity
//! 3. Dispatch new contacts to both entities, then emit [`EngineEvent::Collision`]
//! 4. Reap entities whose active flag went false
//! 5. Emit [`EngineEvent::Tick`]
//!
//! ## Example
//!
//! ```ignore
//! use rio_engine::prelude::*;
//!
//! let mut engine = GameEngine::new(EngineConfig::default(), PhysicsConfig::default());
//! engine.spawn(Entity::player("player", Vec2::new(400.0, 450.0)), BodyShape::rect(40.0, 80.0), BodyOptions::solid())?;
//! engine.start();
//! loop {
//!     if let Some(report) = engine.poll(now_ms()) {
//!         render(&engine, &report);
//!     }
//! }
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod events;
pub mod inventory;
pub mod manager;
pub mod timing;

pub mod prelude {
    pub use crate::command::{CommandSender, EngineCommand};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{EngineState, GameEngine};
    pub use crate::entity::{
        Collectible, CollectibleType, CollisionEffect, ContactInfo, ContactTag, DamageOutcome,
        Entity, EntityKind, EntitySnapshot, EntityType, Fork, Obstacle, ObstacleType, Player,
        PlayerStats, SnapshotKind, Whirlpool,
    };
    pub use crate::error::{EngineError, Result};
    pub use crate::events::{
        CollisionReport, EngineEvent, EngineEventKind, SubscriberId, TickReport,
    };
    pub use crate::inventory::Inventory;
    pub use crate::manager::EntityManager;
    pub use crate::timing::FrameClock;

    pub use rio_math::Vec2;
    pub use rio_physics::{BodyOptions, BodyShape, PhysicsConfig, PhysicsSystem};
}

pub use prelude::*;
