//! Screen state machine

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreenState {
    #[default]
    Boot,
    Menu,
    /// On the water
    River,
    Map,
    Dialogue,
    Inventory,
    Trade,
    Paused,
}

impl ScreenState {
    /// Whether the simulation should be advancing
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::River)
    }

    /// Modal screens opened on top of the river
    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::Dialogue | Self::Trade | Self::Inventory | Self::Map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenTransition {
    pub from: ScreenState,
    pub to: ScreenState,
}

/// Current screen plus the path that led to it
#[derive(Debug)]
pub struct StateManager {
    current: ScreenState,
    /// Visited states, current last
    history: Vec<ScreenState>,
    pending: Vec<ScreenTransition>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            current: ScreenState::Boot,
            history: vec![ScreenState::Boot],
            pending: Vec::new(),
        }
    }

    pub fn current(&self) -> ScreenState {
        self.current
    }

    pub fn is_in(&self, state: ScreenState) -> bool {
        self.current == state
    }

    /// Move to `state`. Returns false if already there.
    pub fn set_state(&mut self, state: ScreenState) -> bool {
        if state == self.current {
            log::warn!("Already in state: {:?}", state);
            return false;
        }
        self.history.push(state);
        self.transition(state);
        true
    }

    /// Return to the previous state. Returns false at the root.
    pub fn go_back(&mut self) -> bool {
        if self.history.len() <= 1 {
            log::warn!("Cannot go back from {:?}: no previous state", self.current);
            return false;
        }
        self.history.pop();
        let Some(&previous) = self.history.last() else {
            return false;
        };
        self.transition(previous);
        true
    }

    pub fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    pub fn history(&self) -> &[ScreenState] {
        &self.history
    }

    /// Transitions since the last drain, oldest first
    pub fn drain_transitions(&mut self) -> Vec<ScreenTransition> {
        std::mem::take(&mut self.pending)
    }

    pub fn reset(&mut self) {
        self.history = vec![ScreenState::Boot];
        self.transition(ScreenState::Boot);
    }

    fn transition(&mut self, to: ScreenState) {
        let from = self.current;
        self.current = to;
        log::debug!("State transition: {:?} -> {:?}", from, to);
        self.pending.push(ScreenTransition { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_round_trip() {
        let mut state = StateManager::new();
        assert!(state.set_state(ScreenState::River));
        assert!(state.set_state(ScreenState::Dialogue));
        assert!(state.go_back());
        assert_eq!(state.current(), ScreenState::River);
        assert_eq!(state.history(), &[ScreenState::Boot, ScreenState::River]);
    }

    #[test]
    fn test_same_state_ignored() {
        let mut state = StateManager::new();
        state.set_state(ScreenState::River);
        assert!(!state.set_state(ScreenState::River));
        assert_eq!(state.history().len(), 2);
    }

    #[test]
    fn test_go_back_at_root() {
        let mut state = StateManager::new();
        assert!(!state.can_go_back());
        assert!(!state.go_back());
        assert_eq!(state.current(), ScreenState::Boot);
    }

    #[test]
    fn test_drain_transitions() {
        let mut state = StateManager::new();
        state.set_state(ScreenState::Menu);
        state.set_state(ScreenState::River);
        let transitions = state.drain_transitions();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[1], ScreenTransition { from: ScreenState::Menu, to: ScreenState::River });
        assert!(state.drain_transitions().is_empty());

        state.reset();
        assert_eq!(state.current(), ScreenState::Boot);
        assert!(!state.can_go_back());
    }
}
