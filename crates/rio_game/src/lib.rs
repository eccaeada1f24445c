//! # rio_game - Game Coordinator
//!
//! Wires the simulation core into a playable river run:
//!
//! - [`Game`] owns the [`GameEngine`](rio_engine::GameEngine), the player,
//!   the [`NavigationManager`](rio_navigation::NavigationManager) and the
//!   content ledgers, and reacts to every engine tick
//! - [`Spawner`] paces obstacles, collectibles and whirlpools
//! - [`StateManager`] tracks which screen the player is on
//! - [`GameContent`] loads the river map, events, quests, specimens and
//!   dialogue trees from JSON
//!
//! Rendering, overlays and audio are injected through the traits in
//! [`services`]; the coordinator never reaches for global state.
//!
//! ## Example
//!
//! ```ignore
//! use rio_game::prelude::*;
//!
//! let services = Services::new(Box::new(MyRenderer::new()), Box::new(MyOverlay));
//! let mut game = Game::new(GameConfig::default(), GameContent::amazon()?, services)?;
//! game.start()?;
//! while !game.is_over() {
//!     game.poll(clock.now_ms());
//! }
//! ```

pub mod config;
pub mod content;
pub mod dialogue;
pub mod error;
pub mod game;
pub mod services;
pub mod spawner;
pub mod state;

pub mod prelude {
    pub use crate::config::{
        AudioConfig, DifficultyLevel, GameConfig, GameplayConfig, NavigationConfig, PlayerConfig,
        SpawnConfig, ViewportConfig,
    };
    pub use crate::content::GameContent;
    pub use crate::dialogue::{
        DialogueChoice, DialogueEffect, DialogueLibrary, DialogueNode, DialogueTree,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::game::{Game, PLAYER_ID};
    pub use crate::services::{
        AudioSink, Overlay, OverlayHost, Renderer, Services, SilentAudio, TextLabel, Viewport,
    };
    pub use crate::spawner::{SpawnRequest, Spawner};
    pub use crate::state::{ScreenState, ScreenTransition, StateManager};
}

pub use prelude::*;
