//! Marker for an upcoming river branch

use rio_navigation::ForkChoice;

pub const FORK_DRIFT: f32 = 36.0;
/// Sensor radius in px
pub const FORK_RADIUS: f32 = 80.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Fork {
    choices: Vec<ForkChoice>,
    selected: Option<usize>,
    spawn_y: f32,
    travelled: f32,
    pub drift: f32,
}

impl Fork {
    pub fn new(choices: Vec<ForkChoice>, spawn_y: f32) -> Self {
        Self {
            choices,
            selected: None,
            spawn_y,
            travelled: 0.0,
            drift: FORK_DRIFT,
        }
    }

    pub fn choices(&self) -> &[ForkChoice] {
        &self.choices
    }

    /// Pick the choice leading along `segment_id`. Once decided, the fork stays decided.
    pub fn select(&mut self, segment_id: &str) -> Option<&ForkChoice> {
        if self.selected.is_some() {
            return None;
        }
        let index = self.choices.iter().position(|c| c.segment_id == segment_id)?;
        self.selected = Some(index);
        let choice = &self.choices[index];
        log::info!("Fork choice selected: {}", choice.description);
        Some(choice)
    }

    /// Take the first choice if nothing was picked yet
    pub fn auto_select(&mut self) -> Option<&ForkChoice> {
        if self.selected.is_some() || self.choices.is_empty() {
            return None;
        }
        self.selected = Some(0);
        let choice = &self.choices[0];
        log::info!("Fork auto-selected: {}", choice.description);
        Some(choice)
    }

    pub fn selected(&self) -> Option<&ForkChoice> {
        self.selected.and_then(|i| self.choices.get(i))
    }

    pub fn is_decided(&self) -> bool {
        self.selected.is_some()
    }

    /// Distance scrolled downstream since the marker spawned (px)
    pub fn travelled(&self) -> f32 {
        self.travelled
    }

    pub(crate) fn track(&mut self, y: f32) {
        self.travelled = (y - self.spawn_y).max(self.travelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rio_navigation::ForkDirection;

    fn choices() -> Vec<ForkChoice> {
        vec![
            ForkChoice {
                segment_id: "seg_a".into(),
                to_node_id: "a".into(),
                direction: ForkDirection::Left,
                description: "LEFT: A".into(),
            },
            ForkChoice {
                segment_id: "seg_b".into(),
                to_node_id: "b".into(),
                direction: ForkDirection::Center,
                description: "CENTER: B".into(),
            },
        ]
    }

    #[test]
    fn test_select_by_segment() {
        let mut fork = Fork::new(choices(), 0.0);
        assert_eq!(fork.select("seg_b").map(|c| c.to_node_id.clone()), Some("b".into()));
        assert!(fork.is_decided());
        assert!(fork.auto_select().is_none());
        assert_eq!(fork.selected().map(|c| c.segment_id.as_str()), Some("seg_b"));
    }

    #[test]
    fn test_unknown_segment() {
        let mut fork = Fork::new(choices(), 0.0);
        assert!(fork.select("nope").is_none());
        assert!(!fork.is_decided());
    }

    #[test]
    fn test_auto_select_first() {
        let mut fork = Fork::new(choices(), 0.0);
        assert_eq!(fork.auto_select().map(|c| c.direction), Some(ForkDirection::Left));
    }

    #[test]
    fn test_travel_tracking() {
        let mut fork = Fork::new(choices(), -100.0);
        fork.track(200.0);
        assert_eq!(fork.travelled(), 300.0);
        fork.track(150.0);
        assert_eq!(fork.travelled(), 300.0);
    }
}
