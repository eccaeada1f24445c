//! Campaign content
//!
//! One JSON document carries everything a campaign needs: the river map,
//! encounter rules, quests, specimens, guidebook entries and dialogue trees.
//! Sections that are missing load as empty.

use crate::dialogue::DialogueTree;
use crate::error::{GameError, Result};
use rio_events::{EventPayload, GameEvent};
use rio_navigation::MapGraph;
use rio_progress::{GuidebookEntry, Quest, Specimen};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const AMAZON: &str = include_str!("../content/amazon.json");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameContent {
    pub map: MapGraph,
    pub events: Vec<GameEvent>,
    pub quests: Vec<Quest>,
    pub specimens: Vec<Specimen>,
    pub guidebook: Vec<GuidebookEntry>,
    pub dialogues: Vec<DialogueTree>,
}

impl GameContent {
    pub fn from_json(json: &str) -> Result<Self> {
        let content: Self = serde_json::from_str(json)?;
        content.validate()?;
        Ok(content)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading content from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The built-in Amazon campaign, Belém to Iquitos
    pub fn amazon() -> Result<Self> {
        Self::from_json(AMAZON)
    }

    /// Check cross references.
    ///
    /// A broken river map is an authoring error and fails the load. Events
    /// pointing at missing dialogues or quests only warn: at runtime they are
    /// skipped.
    pub fn validate(&self) -> Result<()> {
        self.map
            .validate()
            .map_err(|e| GameError::Content(e.to_string()))?;
        if self.map.nodes.is_empty() {
            return Err(GameError::Content("river map has no nodes".to_string()));
        }

        let dialogues: HashSet<&str> = self.dialogues.iter().map(|d| d.id.as_str()).collect();
        let quests: HashSet<&str> = self.quests.iter().map(|q| q.id.as_str()).collect();

        for event in &self.events {
            for dialogue_id in dialogue_refs(&event.payload) {
                if !dialogues.contains(dialogue_id) {
                    log::warn!("Event {} references unknown dialogue {}", event.id, dialogue_id);
                }
            }
            if let EventPayload::Quest { quest_id, .. } = &event.payload {
                if !quests.contains(quest_id.as_str()) {
                    log::warn!("Event {} references unknown quest {}", event.id, quest_id);
                }
            }
        }

        Ok(())
    }
}

fn dialogue_refs(payload: &EventPayload) -> Vec<&str> {
    match payload {
        EventPayload::Dialogue { dialogue_id } => vec![dialogue_id.as_str()],
        EventPayload::Trade { dialogue_id, .. }
        | EventPayload::Quest { dialogue_id, .. }
        | EventPayload::Encounter { dialogue_id, .. } => dialogue_id.iter().map(String::as_str).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rio_events::EventType;

    #[test]
    fn test_amazon_loads() {
        let content = GameContent::amazon().unwrap();
        assert!(content.map.node("belem").is_some());
        assert!(content.map.node("iquitos").is_some());
        assert!(content.map.is_fork("gurupa"));
        assert!(content.map.is_fork("manaus"));
        assert!(!content.events.is_empty());
        assert!(!content.quests.is_empty());
        assert!(!content.specimens.is_empty());
        assert!(content.events.iter().any(|e| e.event_type() == EventType::Hazard));
    }

    #[test]
    fn test_amazon_references_resolve() {
        let content = GameContent::amazon().unwrap();
        let dialogues: HashSet<&str> = content.dialogues.iter().map(|d| d.id.as_str()).collect();
        for event in &content.events {
            for id in dialogue_refs(&event.payload) {
                assert!(dialogues.contains(id), "{} -> {}", event.id, id);
            }
        }
        for tree in &content.dialogues {
            assert!(tree.dangling_links().is_empty(), "{}", tree.id);
        }
    }

    #[test]
    fn test_missing_sections_default() {
        let json = r#"{
            "map": {
                "nodes": [{ "id": "a", "name": "A", "type": "START" }],
                "segments": []
            }
        }"#;
        let content = GameContent::from_json(json).unwrap();
        assert!(content.events.is_empty());
        assert!(content.dialogues.is_empty());
    }

    #[test]
    fn test_broken_map_rejected() {
        let json = r#"{
            "map": {
                "nodes": [{ "id": "a", "name": "A", "type": "START" }],
                "segments": [{ "id": "a_b", "from": "a", "to": "b", "distance": 10 }]
            }
        }"#;
        assert!(matches!(GameContent::from_json(json), Err(GameError::Content(_))));
        assert!(matches!(GameContent::from_json("{ nope"), Err(GameError::Parse(_))));
    }
}
