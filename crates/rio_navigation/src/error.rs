//! Navigation errors

use thiserror::Error;

/// Navigation failures. Every variant leaves the navigation state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("No segment from {from} to {to}")]
    Unreachable { from: String, to: String },

    #[error("Already traveling towards {0}")]
    AlreadyTraveling(String),

    #[error("No fork is pending")]
    NoPendingFork,

    #[error("Segment {0} is not one of the pending fork choices")]
    InvalidForkChoice(String),

    #[error("Fork at {0} needs a choice before departing")]
    ForkUndecided(String),

    #[error("No segment leaves {0}")]
    EndOfRiver(String),

    #[error("Invalid river map: {0}")]
    InvalidMap(String),
}

/// Result type for navigation operations
pub type Result<T> = std::result::Result<T, NavigationError>;
