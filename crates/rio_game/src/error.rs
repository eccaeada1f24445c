//! Game errors

use rio_engine::EngineError;
use rio_navigation::NavigationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid content: {0}")]
    Content(String),

    #[error("Content parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Game has not been started")]
    NotStarted,

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, GameError>;
