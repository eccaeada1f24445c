//! Progress errors

use crate::quest::QuestStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressError {
    #[error("Quest not found: {0}")]
    QuestNotFound(String),

    #[error("Objective {objective} not found in quest {quest}")]
    ObjectiveNotFound { quest: String, objective: String },

    #[error("Quest {id} cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        id: String,
        from: QuestStatus,
        to: QuestStatus,
    },

    #[error("Quest {0} is not active")]
    NotActive(String),

    #[error("Invalid quest {id}: {reason}")]
    InvalidQuest { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ProgressError>;
