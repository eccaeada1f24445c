//! Collaborators the coordinator talks to
//!
//! The simulation only pushes to these: it reads nothing back from a
//! renderer except its viewport, and overlays report closing through
//! [`Game::close_overlay`](crate::Game::close_overlay).

use rio_engine::EntitySnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Named HUD text slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextLabel {
    Score,
    Health,
    Lives,
    Distance,
    Combo,
    Speed,
    Location,
    /// One-off messages: discoveries, quest updates, game over
    Notice,
}

/// Modal UI requested by the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Overlay {
    Dialogue {
        dialogue_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
    },
    Trade {
        merchant_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dialogue_id: Option<String>,
    },
}

pub trait Renderer: Send {
    /// Drawable area; read once when the game starts
    fn viewport(&self) -> Viewport;

    /// Create or move the visual for an entity
    fn draw_entity(&mut self, snapshot: &EntitySnapshot);

    fn remove_entity(&mut self, id: &str);

    fn update_text(&mut self, label: TextLabel, text: &str);
}

pub trait OverlayHost: Send {
    fn open_overlay(&mut self, overlay: &Overlay);

    fn close_overlay(&mut self);
}

pub trait AudioSink: Send {
    fn play_sfx(&mut self, name: &str, volume: f32);

    fn play_music(&mut self, track: &str, volume: f32);

    fn stop_music(&mut self);
}

/// Audio sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play_sfx(&mut self, _name: &str, _volume: f32) {}

    fn play_music(&mut self, _track: &str, _volume: f32) {}

    fn stop_music(&mut self) {}
}

/// Everything injected into a [`Game`](crate::Game)
pub struct Services {
    pub renderer: Box<dyn Renderer>,
    pub overlay: Box<dyn OverlayHost>,
    pub audio: Box<dyn AudioSink>,
}

impl Services {
    pub fn new(renderer: Box<dyn Renderer>, overlay: Box<dyn OverlayHost>) -> Self {
        Self {
            renderer,
            overlay,
            audio: Box::new(SilentAudio),
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("viewport", &self.renderer.viewport())
            .finish_non_exhaustive()
    }
}
