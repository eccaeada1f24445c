//! Navigation state and fork choices

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the traveller is on the graph.
///
/// `target_node_id` is `None` exactly when the traveller is at a node; the
/// segment fields are zeroed in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    pub current_node_id: String,
    pub target_node_id: Option<String>,
    pub current_segment_id: Option<String>,
    pub distance_on_segment: f32,
    pub total_segment_length: f32,
    pub progress_percent: f32,
}

impl NavigationState {
    pub fn at_node(node_id: impl Into<String>) -> Self {
        Self {
            current_node_id: node_id.into(),
            target_node_id: None,
            current_segment_id: None,
            distance_on_segment: 0.0,
            total_segment_length: 0.0,
            progress_percent: 0.0,
        }
    }

    pub fn is_traveling(&self) -> bool {
        self.target_node_id.is_some()
    }

    /// Distance left on the current segment (zero at a node)
    pub fn remaining(&self) -> f32 {
        (self.total_segment_length - self.distance_on_segment).max(0.0)
    }
}

/// Screen-relative direction of a fork branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkDirection {
    Left,
    Center,
    Right,
}

impl ForkDirection {
    /// Direction for the branch at `index`; branches past the third are
    /// all labelled right.
    pub fn for_index(index: usize) -> Self {
        match index {
            0 => Self::Left,
            1 => Self::Center,
            _ => Self::Right,
        }
    }
}

impl fmt::Display for ForkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "LEFT"),
            Self::Center => write!(f, "CENTER"),
            Self::Right => write!(f, "RIGHT"),
        }
    }
}

/// One branch the traveller can take at a fork
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkChoice {
    pub segment_id: String,
    pub to_node_id: String,
    pub direction: ForkDirection,
    pub description: String,
}
