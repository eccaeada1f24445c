//! # rio_navigation - River Graph Navigation
//!
//! A directed graph of river nodes (settlements, junctions, landmarks) joined
//! by segments that carry a length, a current and hazard tags, plus the
//! [`NavigationManager`] state machine that turns distance paddled into
//! progress along that graph.
//!
//! ## States
//!
//! ```text
//!        set_target / depart
//!   AtNode ─────────────────▶ Traveling
//!     ▲                          │
//!     └──── distance ≥ length ───┘   (arrival, edge-triggered)
//! ```
//!
//! While traveling, a node ahead with more than one outgoing segment is
//! published once as a list of [`ForkChoice`]s when it comes within the
//! look-ahead distance.

pub mod error;
pub mod manager;
pub mod map;
pub mod state;

pub mod prelude {
    pub use crate::error::{NavigationError, Result};
    pub use crate::manager::{NavigationManager, NavigationUpdate, FORK_DECISION_DISTANCE};
    pub use crate::map::{Biome, Difficulty, MapGraph, MapNode, NodeType, RiverSegment};
    pub use crate::state::{ForkChoice, ForkDirection, NavigationState};
}

pub use prelude::*;
