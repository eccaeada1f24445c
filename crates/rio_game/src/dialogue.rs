//! Dialogue trees
//!
//! Trees are plain content: a start node, nodes that either branch through
//! choices or auto-advance to `next_node_id`, and optional effects applied
//! when a node is shown or a choice is taken.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Side effect attached to a node or choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueEffect {
    AddItem { item: String, quantity: u32 },
    RemoveItem { item: String, quantity: u32 },
    /// Positive heals, negative hurts
    ChangeHealth { amount: f32 },
    /// Positive restocks, negative consumes
    ChangeRations { amount: f32 },
    UnlockLocation { node_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueChoice {
    pub id: String,
    pub text: String,
    /// `None` ends the conversation
    #[serde(default)]
    pub next_node_id: Option<String>,
    /// Flag that must be raised for the choice to be offered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<DialogueEffect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: String,
    pub speaker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
    pub text: String,
    #[serde(default)]
    pub choices: Vec<DialogueChoice>,
    /// Auto-advance target when there are no choices; `None` ends the conversation
    #[serde(default)]
    pub next_node_id: Option<String>,
    /// Event fired when the node completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_complete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<DialogueEffect>,
}

impl DialogueNode {
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty() && self.next_node_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTree {
    pub id: String,
    pub name: String,
    pub start_node_id: String,
    pub nodes: Vec<DialogueNode>,
}

impl DialogueTree {
    pub fn node(&self, node_id: &str) -> Option<&DialogueNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn start_node(&self) -> Option<&DialogueNode> {
        self.node(&self.start_node_id)
    }

    /// Node and choice targets that name no node in this tree
    pub fn dangling_links(&self) -> Vec<&str> {
        let targets = std::iter::once(Some(self.start_node_id.as_str())).chain(
            self.nodes.iter().flat_map(|n| {
                std::iter::once(n.next_node_id.as_deref())
                    .chain(n.choices.iter().map(|c| c.next_node_id.as_deref()))
            }),
        );
        targets
            .flatten()
            .filter(|id| self.node(id).is_none())
            .collect()
    }
}

/// Registered dialogue trees, by id
#[derive(Debug, Default)]
pub struct DialogueLibrary {
    trees: HashMap<String, DialogueTree>,
}

impl DialogueLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tree, replacing any tree with the same id
    pub fn register(&mut self, tree: DialogueTree) {
        for link in tree.dangling_links() {
            log::warn!("Dialogue {} links to missing node {}", tree.id, link);
        }
        log::debug!("Registered dialogue: {}", tree.id);
        self.trees.insert(tree.id.clone(), tree);
    }

    pub fn register_all(&mut self, trees: impl IntoIterator<Item = DialogueTree>) {
        trees.into_iter().for_each(|t| self.register(t));
    }

    pub fn get(&self, tree_id: &str) -> Option<&DialogueTree> {
        self.trees.get(tree_id)
    }

    pub fn contains(&self, tree_id: &str) -> bool {
        self.trees.contains_key(tree_id)
    }

    pub fn node(&self, tree_id: &str, node_id: &str) -> Option<&DialogueNode> {
        self.trees.get(tree_id)?.node(node_id)
    }

    pub fn start_node(&self, tree_id: &str) -> Option<&DialogueNode> {
        self.trees.get(tree_id)?.start_node()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
