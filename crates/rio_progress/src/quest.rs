//! Quests and objective tracking

use crate::error::{ProgressError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    #[default]
    Available,
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    Collect,
    Reach,
    Talk,
    Discover,
    Survive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestObjective {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ObjectiveKind,
    /// Item, node, NPC or specimen id this objective counts
    pub target: String,
    #[serde(default)]
    pub current: u32,
    pub required: u32,
    #[serde(default)]
    pub completed: bool,
}

impl QuestObjective {
    pub fn new(id: impl Into<String>, kind: ObjectiveKind, target: impl Into<String>, required: u32) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            kind,
            target: target.into(),
            current: 0,
            required,
            completed: false,
        }
    }

    /// Set progress, clamped to `required`.
    fn set_progress(&mut self, value: u32) {
        self.current = value.min(self.required);
        if self.current >= self.required {
            self.completed = true;
        }
    }

    fn reset(&mut self) {
        self.current = 0;
        self.completed = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Item,
    Health,
    Rations,
    Unlock,
    Gold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestReward {
    #[serde(rename = "type")]
    pub kind: RewardKind,
    #[serde(default)]
    pub target: String,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// NPC who hands out the quest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub giver: Option<String>,
    #[serde(default)]
    pub status: QuestStatus,
    pub objectives: Vec<QuestObjective>,
    #[serde(default)]
    pub rewards: Vec<QuestReward>,
    #[serde(default)]
    pub experience: u32,
}

impl Quest {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            giver: None,
            status: QuestStatus::Available,
            objectives: Vec::new(),
            rewards: Vec::new(),
            experience: 0,
        }
    }

    pub fn with_objective(mut self, objective: QuestObjective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_reward(mut self, kind: RewardKind, target: impl Into<String>, amount: u32) -> Self {
        self.rewards.push(QuestReward {
            kind,
            target: target.into(),
            amount,
        });
        self
    }

    pub fn with_experience(mut self, experience: u32) -> Self {
        self.experience = experience;
        self
    }

    pub fn all_objectives_complete(&self) -> bool {
        self.objectives.iter().all(|o| o.completed)
    }

    /// Percentage of completed objectives
    pub fn progress(&self) -> f32 {
        if self.objectives.is_empty() {
            return 0.0;
        }
        let done = self.objectives.iter().filter(|o| o.completed).count();
        done as f32 / self.objectives.len() as f32 * 100.0
    }
}

/// Rewards to apply, handed out exactly once per quest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestCompletion {
    pub quest_id: String,
    pub name: String,
    pub rewards: Vec<QuestReward>,
    pub experience: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestStats {
    pub total_quests: usize,
    pub active_quests: usize,
    pub completed_quests: usize,
    pub failed_quests: usize,
}

/// Quest ledger
#[derive(Debug, Default)]
pub struct QuestManager {
    quests: BTreeMap<String, Quest>,
}

impl QuestManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quest. It starts AVAILABLE with zeroed objectives.
    pub fn register_quest(&mut self, mut quest: Quest) -> Result<()> {
        if quest.objectives.is_empty() {
            return Err(ProgressError::InvalidQuest {
                id: quest.id,
                reason: "no objectives".into(),
            });
        }
        if let Some(o) = quest.objectives.iter().find(|o| o.required == 0) {
            return Err(ProgressError::InvalidQuest {
                reason: format!("objective {} requires nothing", o.id),
                id: quest.id,
            });
        }

        quest.status = QuestStatus::Available;
        quest.objectives.iter_mut().for_each(QuestObjective::reset);
        log::debug!("Registered quest: {}", quest.id);
        self.quests.insert(quest.id.clone(), quest);
        Ok(())
    }

    /// Register many quests; invalid ones are logged and skipped.
    pub fn register_quests(&mut self, quests: impl IntoIterator<Item = Quest>) -> usize {
        let mut count = 0;
        for quest in quests {
            match self.register_quest(quest) {
                Ok(()) => count += 1,
                Err(e) => log::warn!("Skipping quest: {}", e),
            }
        }
        count
    }

    fn quest_mut(&mut self, quest_id: &str) -> Result<&mut Quest> {
        self.quests
            .get_mut(quest_id)
            .ok_or_else(|| ProgressError::QuestNotFound(quest_id.to_string()))
    }

    fn transition(quest: &mut Quest, from: QuestStatus, to: QuestStatus) -> Result<()> {
        if quest.status != from {
            return Err(ProgressError::InvalidTransition {
                id: quest.id.clone(),
                from: quest.status,
                to,
            });
        }
        quest.status = to;
        Ok(())
    }

    /// AVAILABLE → ACTIVE
    pub fn start_quest(&mut self, quest_id: &str) -> Result<()> {
        let quest = self.quest_mut(quest_id)?;
        Self::transition(quest, QuestStatus::Available, QuestStatus::Active)?;
        log::info!("Started quest: {}", quest.name);
        Ok(())
    }

    /// Set an objective's progress. Returns the completion if this finished the quest.
    pub fn update_objective(&mut self, quest_id: &str, objective_id: &str, progress: u32) -> Result<Option<QuestCompletion>> {
        self.with_objective(quest_id, objective_id, |o| o.set_progress(progress))
    }

    /// Add to an objective's progress. Returns the completion if this finished the quest.
    pub fn increment_objective(&mut self, quest_id: &str, objective_id: &str, amount: u32) -> Result<Option<QuestCompletion>> {
        self.with_objective(quest_id, objective_id, |o| o.set_progress(o.current.saturating_add(amount)))
    }

    fn with_objective(
        &mut self,
        quest_id: &str,
        objective_id: &str,
        apply: impl FnOnce(&mut QuestObjective),
    ) -> Result<Option<QuestCompletion>> {
        let quest = self.quest_mut(quest_id)?;
        if quest.status != QuestStatus::Active {
            return Err(ProgressError::NotActive(quest_id.to_string()));
        }
        let objective = quest
            .objectives
            .iter_mut()
            .find(|o| o.id == objective_id)
            .ok_or_else(|| ProgressError::ObjectiveNotFound {
                quest: quest_id.to_string(),
                objective: objective_id.to_string(),
            })?;
        apply(objective);
        Ok(Self::check_completion(quest))
    }

    /// Advance every active objective of `kind` targeting `target`.
    pub fn record(&mut self, kind: ObjectiveKind, target: &str, amount: u32) -> Vec<QuestCompletion> {
        let mut completions = Vec::new();
        for quest in self.quests.values_mut() {
            if quest.status != QuestStatus::Active {
                continue;
            }
            let mut touched = false;
            for objective in quest.objectives.iter_mut() {
                if objective.kind == kind && objective.target == target && !objective.completed {
                    objective.set_progress(objective.current.saturating_add(amount));
                    touched = true;
                }
            }
            if touched {
                completions.extend(Self::check_completion(quest));
            }
        }
        completions
    }

    fn check_completion(quest: &mut Quest) -> Option<QuestCompletion> {
        if quest.status != QuestStatus::Active || !quest.all_objectives_complete() {
            return None;
        }
        quest.status = QuestStatus::Completed;
        log::info!("Completed quest: {}", quest.name);
        Some(QuestCompletion {
            quest_id: quest.id.clone(),
            name: quest.name.clone(),
            rewards: quest.rewards.clone(),
            experience: quest.experience,
        })
    }

    /// Force-complete an active quest, filling every objective.
    pub fn complete_quest(&mut self, quest_id: &str) -> Result<QuestCompletion> {
        let quest = self.quest_mut(quest_id)?;
        if quest.status != QuestStatus::Active {
            return Err(ProgressError::InvalidTransition {
                id: quest_id.to_string(),
                from: quest.status,
                to: QuestStatus::Completed,
            });
        }
        for objective in quest.objectives.iter_mut() {
            objective.set_progress(objective.required);
        }
        Self::check_completion(quest).ok_or_else(|| ProgressError::NotActive(quest_id.to_string()))
    }

    /// ACTIVE → FAILED
    pub fn fail_quest(&mut self, quest_id: &str) -> Result<()> {
        let quest = self.quest_mut(quest_id)?;
        Self::transition(quest, QuestStatus::Active, QuestStatus::Failed)?;
        log::info!("Failed quest: {}", quest.name);
        Ok(())
    }

    // ==================== Queries ====================

    pub fn quest(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.get(quest_id)
    }

    pub fn quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    fn with_status(&self, status: QuestStatus) -> impl Iterator<Item = &Quest> {
        self.quests.values().filter(move |q| q.status == status)
    }

    pub fn active_quests(&self) -> impl Iterator<Item = &Quest> {
        self.with_status(QuestStatus::Active)
    }

    pub fn available_quests(&self) -> impl Iterator<Item = &Quest> {
        self.with_status(QuestStatus::Available)
    }

    pub fn completed_quests(&self) -> impl Iterator<Item = &Quest> {
        self.with_status(QuestStatus::Completed)
    }

    /// Percentage of completed objectives; 0 for unknown quests
    pub fn progress(&self, quest_id: &str) -> f32 {
        self.quests.get(quest_id).map(Quest::progress).unwrap_or(0.0)
    }

    fn status(&self, quest_id: &str) -> Option<QuestStatus> {
        self.quests.get(quest_id).map(|q| q.status)
    }

    pub fn is_available(&self, quest_id: &str) -> bool {
        self.status(quest_id) == Some(QuestStatus::Available)
    }

    pub fn is_active(&self, quest_id: &str) -> bool {
        self.status(quest_id) == Some(QuestStatus::Active)
    }

    pub fn is_completed(&self, quest_id: &str) -> bool {
        self.status(quest_id) == Some(QuestStatus::Completed)
    }

    pub fn stats(&self) -> QuestStats {
        QuestStats {
            total_quests: self.quests.len(),
            active_quests: self.active_quests().count(),
            completed_quests: self.completed_quests().count(),
            failed_quests: self.with_status(QuestStatus::Failed).count(),
        }
    }

    /// Every quest back to AVAILABLE with zeroed objectives
    pub fn reset(&mut self) {
        for quest in self.quests.values_mut() {
            quest.status = QuestStatus::Available;
            quest.objectives.iter_mut().for_each(QuestObjective::reset);
        }
        log::debug!("Quest state reset");
    }
}
