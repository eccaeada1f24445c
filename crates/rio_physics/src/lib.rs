//! Rio Physics - Rapier 2D Integration
//!
//! Rigid-body simulation for the river. Bodies are keyed by the string id of
//! the entity that owns them and live in an arena owned by [`PhysicsSystem`];
//! entities hold a [`BodyHandle`] (index + generation), never a Rapier handle.
//!
//! # Features
//!
//! - Zero gravity with water-like linear drag on every body
//! - Solid bodies (full collision response) and sensors (detection only)
//! - Rectangle and circle shapes
//! - Currently-touching pair queries for both contacts and intersections
//! - Unknown ids are silent no-ops
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                PhysicsSystem                 │
//! │  ┌────────────┐  ┌────────────┐  ┌─────────┐ │
//! │  │ Body arena │  │ id → handle│  │ Rapier  │ │
//! │  │ (slots)    │  │ collider → │  │ sets    │ │
//! │  └────────────┘  └────────────┘  └─────────┘ │
//! │  ┌──────────────────────────────────────────┐│
//! │  │ PhysicsPipeline (substepped per update)  ││
//! │  └──────────────────────────────────────────┘│
//! └──────────────────────────────────────────────┘
//!                        │
//!                        ▼
//!              Vec<CollisionPair> (ids)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rio_physics::prelude::*;
//! use rio_math::Vec2;
//!
//! let mut physics = PhysicsSystem::new(PhysicsConfig::default());
//! physics.create_body("player", BodyShape::rect(40.0, 80.0), Vec2::new(400.0, 450.0), BodyOptions::solid())?;
//! physics.apply_force("player", Vec2::new(0.0, -600.0));
//! physics.update(1000.0 / 60.0);
//! for pair in physics.check_collisions() {
//!     println!("{} touches {}", pair.a, pair.b);
//! }
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod events;
pub mod world;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{BodyHandle, BodyOptions, BodyShape, BodyState};
    pub use crate::config::PhysicsConfig;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::CollisionPair;
    pub use crate::world::PhysicsSystem;
}

pub use prelude::*;
