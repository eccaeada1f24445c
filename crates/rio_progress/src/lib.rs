//! # rio_progress - Quests and Collections
//!
//! Ledgers driven by discrete game occurrences reported by the coordinator:
//!
//! - [`QuestManager`]: quest status transitions and objective counters.
//!   Completing a quest hands back a [`QuestCompletion`] with the rewards to
//!   apply; nothing is held as pending state.
//! - [`SpecimenManager`]: idempotent specimen discovery and the guidebook
//!   entries those discoveries unlock.

pub mod error;
pub mod quest;
pub mod specimen;

pub mod prelude {
    pub use crate::error::{ProgressError, Result};
    pub use crate::quest::{
        ObjectiveKind, Quest, QuestCompletion, QuestManager, QuestObjective, QuestReward,
        QuestStats, QuestStatus, RewardKind,
    };
    pub use crate::specimen::{
        Discovery, GuidebookCategory, GuidebookEntry, Rarity, Specimen, SpecimenCategory,
        SpecimenManager, SpecimenStats,
    };
}

pub use prelude::*;
