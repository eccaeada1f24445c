//! Engine errors

use rio_physics::PhysicsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Entity already exists: {0}")]
    DuplicateEntity(String),

    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
