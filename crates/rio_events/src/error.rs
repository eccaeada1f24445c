//! Event errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("Event not found: {0}")]
    UnknownEvent(String),

    #[error("Event already active: {0}")]
    AlreadyActive(String),

    #[error("Event already completed and not repeatable: {0}")]
    AlreadyCompleted(String),

    #[error("Invalid event {id}: {reason}")]
    InvalidEvent { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EventError>;
