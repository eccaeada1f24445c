//! Log-backed presentation services
//!
//! Stands in for a real renderer: HUD labels are logged when they change,
//! notices always, entities only when they appear or go away.

use parking_lot::Mutex;
use rio_engine::{EntitySnapshot, EntityType};
use rio_game::{AudioSink, Overlay, OverlayHost, Renderer, TextLabel, Viewport};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ConsoleState {
    labels: BTreeMap<TextLabel, String>,
    visible: HashSet<String>,
    overlay: Option<Overlay>,
}

/// Shared handle; clones write to the same console
#[derive(Debug, Clone)]
pub struct Console {
    viewport: Viewport,
    state: Arc<Mutex<ConsoleState>>,
}

impl Console {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            state: Arc::new(Mutex::new(ConsoleState::default())),
        }
    }

    /// Last text written to `label`
    pub fn label(&self, label: TextLabel) -> Option<String> {
        self.state.lock().labels.get(&label).cloned()
    }

    /// One line with every HUD label
    pub fn hud_line(&self) -> String {
        let state = self.state.lock();
        state
            .labels
            .iter()
            .filter(|(label, text)| **label != TextLabel::Notice && !text.is_empty())
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn visible_count(&self) -> usize {
        self.state.lock().visible.len()
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.state.lock().overlay.clone()
    }
}

impl Renderer for Console {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn draw_entity(&mut self, snapshot: &EntitySnapshot) {
        let mut state = self.state.lock();
        if state.visible.insert(snapshot.id.clone()) && snapshot.entity_type != EntityType::Player {
            log::debug!(
                "+ {} ({:?}) at ({:.0}, {:.0})",
                snapshot.id,
                snapshot.kind,
                snapshot.position.x,
                snapshot.position.y
            );
        }
    }

    fn remove_entity(&mut self, id: &str) {
        if self.state.lock().visible.remove(id) {
            log::trace!("- {}", id);
        }
    }

    fn update_text(&mut self, label: TextLabel, text: &str) {
        if label == TextLabel::Notice {
            log::info!(">> {}", text);
        }
        let mut state = self.state.lock();
        let changed = state.labels.get(&label).map_or(true, |old| old != text);
        if changed {
            log::trace!("{:?}: {}", label, text);
            state.labels.insert(label, text.to_string());
        }
    }
}

impl OverlayHost for Console {
    fn open_overlay(&mut self, overlay: &Overlay) {
        match overlay {
            Overlay::Dialogue { dialogue_id, speaker } => {
                log::info!("[dialogue {}] {}", dialogue_id, speaker.as_deref().unwrap_or(""));
            }
            Overlay::Trade { merchant_id, .. } => {
                log::info!("[trade] {} wants to trade (c to leave)", merchant_id);
            }
        }
        self.state.lock().overlay = Some(overlay.clone());
    }

    fn close_overlay(&mut self) {
        if self.state.lock().overlay.take().is_some() {
            log::info!("[overlay closed]");
        }
    }
}

/// Sound cues as trace logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play_sfx(&mut self, name: &str, volume: f32) {
        log::trace!("sfx {} @ {:.2}", name, volume);
    }

    fn play_music(&mut self, track: &str, volume: f32) {
        log::debug!("music {} @ {:.2}", track, volume);
    }

    fn stop_music(&mut self) {
        log::debug!("music stopped");
    }
}
